use super::*;

fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    fn is_entity_token_char(ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '#'
    }

    fn decode_numeric(value: &str) -> Option<char> {
        let codepoint =
            if let Some(hex) = value.strip_prefix('x').or_else(|| value.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                value.parse::<u32>().ok()?
            };
        char::from_u32(codepoint)
    }

    fn decode_named(value: &str) -> Option<char> {
        match value {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "copy" => Some('©'),
            "reg" => Some('®'),
            "trade" => Some('™'),
            "euro" => Some('€'),
            "pound" => Some('£'),
            "yen" => Some('¥'),
            "laquo" => Some('«'),
            "raquo" => Some('»'),
            "ldquo" => Some('“'),
            "rdquo" => Some('”'),
            "lsquo" => Some('‘'),
            "rsquo" => Some('’'),
            "ndash" => Some('–'),
            "mdash" => Some('—'),
            "hellip" => Some('…'),
            "middot" => Some('·'),
            "bull" => Some('•'),
            "deg" => Some('°'),
            "times" => Some('×'),
            "larr" => Some('←'),
            "rarr" => Some('→'),
            _ => None,
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let token_end = tail
            .char_indices()
            .find_map(|(idx, ch)| (!is_entity_token_char(ch)).then_some(idx))
            .unwrap_or(tail.len());
        let raw = &tail[..token_end];
        let decoded = if let Some(numeric) = raw.strip_prefix('#') {
            decode_numeric(numeric)
        } else {
            decode_named(raw)
        };

        match decoded {
            Some(ch) if !raw.is_empty() => {
                out.push(ch);
                let consumed = if tail[token_end..].starts_with(';') {
                    token_end + 1
                } else {
                    token_end
                };
                rest = &tail[consumed..];
            }
            _ => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut stack = vec![dom.root()];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            // `<!-->` and `<!--->` are complete empty comments.
            if starts_with_at(bytes, i + 4, b">") {
                i += 5;
                continue;
            }
            if starts_with_at(bytes, i + 4, b"->") {
                i += 6;
                continue;
            }
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
            i = end + 3;
            continue;
        }

        if bytes[i] == b'<' && starts_with_at(bytes, i, b"</") && is_tag_start(bytes.get(i + 2)) {
            let (tag, next) = parse_end_tag(html, i)?;
            i = next;
            close_open_element(&dom, &mut stack, &tag);
            continue;
        }

        if bytes[i] == b'<' && starts_with_at(bytes, i, b"<!") {
            let (declaration, next) = parse_declaration_tag(html, i)?;
            if let Some(doctype) = doctype_name(declaration) {
                dom.set_doctype(doctype);
            }
            i = next;
            continue;
        }

        if bytes[i] == b'<' && is_tag_start(bytes.get(i + 1)) {
            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;
            close_optional_end_tags(&dom, &mut stack, &tag);

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if is_raw_text_tag(&tag) && !self_closing {
                let close = find_case_insensitive_raw_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                let body = html
                    .get(i..close)
                    .ok_or_else(|| Error::HtmlParse(format!("invalid <{tag}> body")))?;
                let body = if is_escapable_raw_text_tag(&tag) {
                    decode_html_character_references(body)
                } else {
                    body.to_string()
                };
                if !body.is_empty() {
                    dom.create_text(node, body);
                }
                let (_, after_end) = parse_end_tag(html, close)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let decoded = decode_html_character_references(text);
            if !decoded.is_empty() {
                dom.create_text(parent, decoded);
            }
        }
    }

    Ok(dom)
}

fn close_open_element(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    // Stray end tags with no matching open element are ignored.
    let Some(index) = (1..stack.len())
        .rev()
        .find(|index| dom.tag_name(stack[*index]) == Some(tag))
    else {
        return;
    };
    stack.truncate(index);
}

fn close_optional_end_tags(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    let (closes, boundaries): (&[&str], &[&str]) = match tag {
        "li" => (&["li"], &["ol", "ul", "menu"]),
        "dt" | "dd" => (&["dt", "dd"], &["dl"]),
        "option" => (&["option"], &["select", "datalist", "optgroup"]),
        "optgroup" => (&["optgroup", "option"], &["select"]),
        tag if is_paragraph_terminator_tag(tag) => (&["p"], &["button", "td", "th", "template"]),
        _ => return,
    };

    let mut close_index = None;
    for index in (1..stack.len()).rev() {
        let Some(open_tag) = dom.tag_name(stack[index]) else {
            continue;
        };
        if closes.contains(&open_tag) {
            close_index = Some(index);
            break;
        }
        if boundaries.contains(&open_tag) {
            break;
        }
    }

    if let Some(index) = close_index {
        stack.truncate(index);
    }
}

fn is_paragraph_terminator_tag(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "details"
            | "div"
            | "dl"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "title" | "textarea")
}

fn is_escapable_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "title" | "textarea")
}

fn doctype_name(declaration: &str) -> Option<String> {
    let body = declaration
        .strip_prefix("<!")?
        .strip_suffix('>')?
        .trim_start();
    let keyword = body.get(..7)?;
    if !keyword.eq_ignore_ascii_case("doctype") {
        return None;
    }
    let name = body[7..].split_whitespace().next().unwrap_or_default();
    Some(name.to_ascii_lowercase())
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;
    if bytes.get(i) != Some(&b'<') {
        return Err(Error::HtmlParse("expected '<'".into()));
    }
    i += 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();

    if tag.is_empty() {
        return Err(Error::HtmlParse("empty tag name".into()));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(Error::HtmlParse(format!("unclosed start tag <{tag}>")));
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>') {
            self_closing = true;
            i += 2;
            break;
        }

        if !is_attr_name_char(bytes[i]) {
            // Skip junk such as a stray quote or slash between attributes.
            i += 1;
            continue;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }

        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        skip_ws(bytes, &mut i);

        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, bytes, &mut i)?
        } else {
            String::new()
        };

        // First occurrence wins, as in browsers.
        attrs.entry(name).or_insert(value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_declaration_tag(html: &str, at: usize) -> Result<(&str, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if b == b'>' => {
                let declaration = html
                    .get(at..i + 1)
                    .ok_or_else(|| Error::HtmlParse("invalid declaration".into()))?;
                return Ok((declaration, i + 1));
            }
            None => {}
        }
        i += 1;
    }

    Err(Error::HtmlParse("unclosed declaration tag".into()))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;

    if !(bytes.get(i) == Some(&b'<') && bytes.get(i + 1) == Some(&b'/')) {
        return Err(Error::HtmlParse("expected end tag".into()));
    }
    i += 2;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(Error::HtmlParse(format!("unclosed end tag </{tag}>")));
    }

    Ok((tag, i + 1))
}

fn parse_attr_value(html: &str, bytes: &[u8], i: &mut usize) -> Result<String> {
    if *i >= bytes.len() {
        return Err(Error::HtmlParse("missing attribute value".into()));
    }

    if bytes[*i] == b'\'' || bytes[*i] == b'"' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = html
            .get(start..*i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
        *i += 1;
        return Ok(decode_html_character_references(value));
    }

    let start = *i;
    while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
        *i += 1;
    }

    let value = html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
    Ok(decode_html_character_references(value))
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_start(b: Option<&u8>) -> bool {
    b.is_some_and(|b| b.is_ascii_alphabetic())
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':' || b == b'.' || b == b'@'
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .is_some_and(|window| window == needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_case_insensitive_raw_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' && bytes.get(i + 1) == Some(&b'/') {
            let j = i + 2;
            let tag_end = j + tag.len();
            if tag_end <= bytes.len() && bytes[j..tag_end].eq_ignore_ascii_case(tag) {
                if tag_end >= bytes.len() || !bytes[tag_end].is_ascii_alphanumeric() {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(dom: &Dom, selector: &str) -> NodeId {
        let found = dom
            .query_selector_all_from(dom.root(), selector)
            .expect("selector should parse");
        assert_eq!(found.len(), 1, "expected one match for {selector}");
        found[0]
    }

    #[test]
    fn records_doctype_and_skips_comments() -> Result<()> {
        let dom = parse_html("<!DOCTYPE html>\n<!-- note --><html lang=\"en\"><body>x</body></html>")?;
        assert_eq!(dom.doctype(), Some("html"));
        let html = only(&dom, "html");
        assert_eq!(dom.attr(html, "lang"), Some("en"));
        assert_eq!(dom.text_content(html), "x");
        Ok(())
    }

    #[test]
    fn abrupt_empty_comments_are_closed() -> Result<()> {
        let dom = parse_html("<p>a<!-->b<!--->c<!---->d</p>")?;
        let p = only(&dom, "p");
        assert_eq!(dom.text_content(p), "abcd");
        assert!(parse_html("<p>a<!-- x -></p>").is_err());
        Ok(())
    }

    #[test]
    fn void_and_self_closing_elements_do_not_swallow_siblings() -> Result<()> {
        let dom = parse_html(
            "<head><meta charset=\"UTF-8\"><link rel=stylesheet href=a.css/></head><body><br/><p>t</p></body>",
        )?;
        let meta = only(&dom, "meta");
        assert_eq!(dom.attr(meta, "charset"), Some("UTF-8"));
        assert!(dom.element_children(meta).is_empty());
        let body = only(&dom, "body");
        assert_eq!(dom.element_children(body).len(), 2);
        Ok(())
    }

    #[test]
    fn style_and_script_bodies_are_raw_text() -> Result<()> {
        let dom = parse_html(
            "<style>nav { width: 180px; } a > b {}</style><script>if (a < b) {}</script><p>after</p>",
        )?;
        let style = only(&dom, "style");
        assert_eq!(dom.text_content(style), "nav { width: 180px; } a > b {}");
        assert!(dom.element_children(style).is_empty());
        let script = only(&dom, "script");
        assert_eq!(dom.text_content(script), "if (a < b) {}");
        only(&dom, "p");
        Ok(())
    }

    #[test]
    fn title_decodes_character_references() -> Result<()> {
        let dom = parse_html("<title>Tom &amp; Jerry&#x21;</title>")?;
        let title = only(&dom, "title");
        assert_eq!(dom.text_content(title), "Tom & Jerry!");
        Ok(())
    }

    #[test]
    fn implied_end_tags_close_list_items_and_paragraphs() -> Result<()> {
        let dom = parse_html("<ul><li>one<li>two</ul><p>para<div>block</div>")?;
        let ul = only(&dom, "ul");
        assert_eq!(dom.element_children(ul).len(), 2);
        let div = only(&dom, "div");
        assert_eq!(dom.tag_name(dom.parent(div).expect("div parent")), None);
        Ok(())
    }

    #[test]
    fn stray_end_tags_are_ignored() -> Result<()> {
        let dom = parse_html("<div>a</span>b</div>")?;
        let div = only(&dom, "div");
        assert_eq!(dom.text_content(div), "ab");
        Ok(())
    }

    #[test]
    fn valueless_and_duplicate_attributes() -> Result<()> {
        let dom = parse_html("<a href class='x' class='y'>x</a>")?;
        let a = only(&dom, "a");
        assert_eq!(dom.attr(a, "href"), Some(""));
        assert_eq!(dom.attr(a, "class"), Some("x"));
        Ok(())
    }

    #[test]
    fn text_keeps_unicode_and_decodes_entities() -> Result<()> {
        let dom = parse_html("<footer>&copy; 2026 Leo Ọládimú &lt;3</footer>")?;
        let footer = only(&dom, "footer");
        assert_eq!(dom.text_content(footer), "© 2026 Leo Ọládimú <3");
        Ok(())
    }

    #[test]
    fn unknown_entities_and_bare_ampersands_are_kept() {
        assert_eq!(decode_html_character_references("a & b"), "a & b");
        assert_eq!(decode_html_character_references("&bogus;"), "&bogus;");
        assert_eq!(decode_html_character_references("&amp"), "&");
        assert_eq!(decode_html_character_references("&#169;"), "©");
    }

    #[test]
    fn less_than_not_followed_by_tag_is_text() -> Result<()> {
        let dom = parse_html("<p>1 < 2 and 3 <= 4</p>")?;
        let p = only(&dom, "p");
        assert_eq!(dom.text_content(p), "1 < 2 and 3 <= 4");
        Ok(())
    }

    #[test]
    fn unterminated_constructs_are_errors() {
        assert!(matches!(parse_html("<!-- open"), Err(Error::HtmlParse(_))));
        assert!(matches!(parse_html("<div class='x"), Err(Error::HtmlParse(_))));
        assert!(matches!(parse_html("<style>a {}"), Err(Error::HtmlParse(_))));
        assert!(matches!(parse_html("<p"), Err(Error::HtmlParse(_))));
    }
}
