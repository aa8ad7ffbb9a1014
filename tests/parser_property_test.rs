use page_tester::{Document, expect};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;
use unicode_normalization::UnicodeNormalization;

fn container_tag_strategy() -> BoxedStrategy<&'static str> {
    prop_oneof![
        Just("div"),
        Just("span"),
        Just("section"),
        Just("article"),
        Just("em"),
        Just("strong"),
    ]
    .boxed()
}

/// Generated markup paired with the text content it must produce.
fn markup_strategy() -> BoxedStrategy<(String, String)> {
    let leaf = "[a-z]{1,6}( [a-z]{1,6})?"
        .prop_map(|text| (text.clone(), text))
        .boxed();

    leaf.prop_recursive(4, 64, 4, |inner| {
        (
            container_tag_strategy(),
            prop::option::of("[a-z]{1,5}"),
            vec(inner, 0..=4),
        )
            .prop_map(|(tag, class, children)| {
                let (markup, text): (Vec<_>, Vec<_>) = children.into_iter().unzip();
                let class = class
                    .map(|name| format!(" class=\"{name}\""))
                    .unwrap_or_default();
                (
                    format!("<{tag}{class}>{}</{tag}>", markup.concat()),
                    text.concat(),
                )
            })
    })
    .boxed()
}

fn accented_text_strategy() -> BoxedStrategy<String> {
    vec(
        prop_oneof![
            Just('a'),
            Just('e'),
            Just('o'),
            Just(' '),
            Just('á'),
            Just('é'),
            Just('ú'),
            Just('Ọ'),
            Just('ñ'),
            Just('©'),
        ],
        1..24,
    )
    .prop_map(|chars| chars.into_iter().collect())
    .boxed()
}

fn assert_text_preserved(markup: &str, expected: &str) -> TestCaseResult {
    let html = format!("<main id=\"root\">{markup}</main>");
    let doc = Document::parse(html.as_str())
        .map_err(|err| TestCaseError::fail(format!("parse failed: {err}")))?;
    let root = doc
        .query_selector("#root")
        .map_err(|err| TestCaseError::fail(err.to_string()))?;
    prop_assert!(root.is_some(), "root element missing for {markup}");
    let text = root.map(|root| root.text()).unwrap_or_default();
    prop_assert_eq!(text, expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn well_nested_markup_keeps_all_text((markup, text) in markup_strategy()) {
        assert_text_preserved(&markup, &text)?;
    }

    #[test]
    fn list_items_without_end_tags_are_siblings(items in vec("[a-z]{1,8}", 1..12)) {
        let markup = items
            .iter()
            .map(|item| format!("<li>{item}"))
            .collect::<String>();
        let doc = Document::parse(format!("<nav><ul>{markup}</ul></nav>"))
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let found = doc
            .query_selector_all("nav > ul > li")
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let texts = found.iter().map(|li| li.text()).collect::<Vec<_>>();
        prop_assert_eq!(texts, items);
    }

    #[test]
    fn containment_ignores_normalization_form(
        text in accented_text_strategy(),
        start in 0usize..24,
        len in 0usize..24,
    ) {
        let chars = text.chars().collect::<Vec<_>>();
        let start = start.min(chars.len());
        let end = (start + len).min(chars.len());
        let needle = chars[start..end].iter().collect::<String>();

        let decomposed = text.nfd().collect::<String>();
        prop_assert!(expect::text_contains(&decomposed, &needle));
        prop_assert!(expect::text_contains(&text, &needle.nfd().collect::<String>()));
    }

    #[test]
    fn arbitrary_input_never_panics(input in ".{0,200}") {
        let outcome = std::panic::catch_unwind(|| Document::parse(input.as_str()).map(|_| ()));
        prop_assert!(outcome.is_ok(), "Document::parse panicked for {input:?}");
    }
}
