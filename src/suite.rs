//! The cases declared for a page.
//!
//! Structural cases are declared for every page. Content cases are declared
//! only when the [`PageSpec`] names the value they check.

use tracing::debug;

use crate::expect;
use crate::runner::{Fixture, Section, Suite};
use crate::{HarnessConfig, PageSpec, Result, discover_pages};

const CHARSET_META: &str = r#"<meta charset="UTF-8">"#;
const VIEWPORT_META: &str =
    r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#;

/// `home.html` becomes `Home Page`.
fn suite_name(file: &str) -> String {
    let stem = file.rsplit('/').next().unwrap_or(file);
    let stem = stem.split('.').next().unwrap_or(stem);
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => format!("{}{} Page", first.to_uppercase(), chars.as_str()),
        None => "Page".to_string(),
    }
}

fn raw_contains_all(fx: &Fixture, expectation: &str, needles: &[String]) -> Result<()> {
    for needle in needles {
        expect::contains(expectation, fx.raw(), needle)?;
    }
    Ok(())
}

pub fn build_suite(spec: &PageSpec) -> Suite {
    Suite::new(suite_name(&spec.file), spec.file.clone())
        .section(document_structure(spec))
        .section(navigation(spec))
        .section(main_content(spec))
        .section(footer(spec))
        .section(css_styles(spec))
        .section(content_validation(spec))
}

/// One suite per configured page, or per discovered page when the config
/// lists none.
pub fn build_site_suites(config: &HarnessConfig) -> Result<Vec<Suite>> {
    if !config.pages.is_empty() {
        return Ok(config.pages.iter().map(build_suite).collect());
    }
    let pages = discover_pages(&config.root, &config.extensions)?;
    debug!(count = pages.len(), "no pages configured, using discovered pages");
    Ok(pages
        .into_iter()
        .map(|file| build_suite(&PageSpec::new(file)))
        .collect())
}

fn document_structure(spec: &PageSpec) -> Section {
    let mut section = Section::new("Document Structure")
        .case("has doctype and html structure", |fx| {
            let raw = fx.raw();
            expect::matches("doctype declaration", raw, "/<!DOCTYPE html>/i")?;
            expect::matches("html element with lang", raw, r#"/<html lang="en">/i"#)?;
            expect::matches("head element", raw, "/<head>.*</head>/s")?;
            expect::matches("body element", raw, "/<body>.*</body>/s")
        })
        .case("has charset and viewport meta tags", |fx| {
            expect::contains("charset meta tag", fx.raw(), CHARSET_META)?;
            expect::contains("viewport meta tag", fx.raw(), VIEWPORT_META)
        });

    if let Some(title) = spec.title.clone() {
        section = section.case("has the expected title", move |fx| {
            expect::contains("title markup", fx.raw(), &format!("<title>{title}</title>"))?;
            let parsed = fx.document().title()?.unwrap_or_default();
            expect::equals("title text", &title, &parsed)
        });
    }
    section
}

fn navigation(spec: &PageSpec) -> Section {
    let mut section = Section::new("Navigation").case("has a navigation element", |fx| {
        let nav = fx.document().query_selector("nav")?;
        expect::present("navigation element", "nav", nav).map(|_| ())
    });

    if !spec.nav.is_empty() {
        let links = spec.nav.clone();
        section = section.case("links each page with the right label", move |fx| {
            let anchors = fx.document().query_selector_all("a[href]")?;
            for link in &links {
                let selector = format!("a[href=\"{}\"]", link.href);
                let matching = anchors
                    .iter()
                    .copied()
                    .filter(|anchor| anchor.attr("href") == Some(link.href.as_str()))
                    .collect::<Vec<_>>();
                expect::count(&format!("link to {}", link.href), &selector, 1, &matching)?;
                expect::equals(
                    &format!("label of {}", link.href),
                    &link.text,
                    &matching[0].trimmed_text(),
                )?;
            }
            Ok(())
        });
    }

    let page = spec.file.clone();
    section.case("marks its own link as active", move |fx| {
        let active = fx.document().query_selector_all("a.active")?;
        expect::count("active link", "a.active", 1, &active)?;
        expect::equals(
            "active link target",
            &page,
            active[0].attr("href").unwrap_or_default(),
        )
    })
}

fn main_content(spec: &PageSpec) -> Section {
    let mut section = Section::new("Main Content").case("has a main content container", |fx| {
        let container = fx.document().query_selector(".main-content")?;
        expect::present("main content container", ".main-content", container).map(|_| ())
    });

    if spec.heading.is_some() || spec.subtitle.is_some() {
        let heading = spec.heading.clone();
        let subtitle = spec.subtitle.clone();
        section = section.case("displays name and subtitle", move |fx| {
            let doc = fx.document();
            if let Some(heading) = &heading {
                let h1 = expect::present("page heading", "h1", doc.query_selector("h1")?)?;
                expect::equals("page heading text", heading, &h1.trimmed_text())?;
            }
            if let Some(subtitle) = &subtitle {
                let found = doc.query_selector(".subtitle")?;
                let element = expect::present("subtitle", ".subtitle", found)?;
                expect::equals("subtitle text", subtitle, &element.trimmed_text())?;
            }
            Ok(())
        });
    }

    if spec.welcome_heading.is_some() || spec.welcome_text.is_some() {
        let heading = spec.welcome_heading.clone();
        let text = spec.welcome_text.clone();
        section = section.case("has a welcome section", move |fx| {
            let doc = fx.document();
            if let Some(heading) = &heading {
                let h2 = expect::present("welcome heading", "h2", doc.query_selector("h2")?)?;
                expect::equals("welcome heading text", heading, &h2.trimmed_text())?;
            }
            if let Some(text) = &text {
                let found = doc.query_selector("main p")?;
                let paragraph = expect::present("welcome paragraph", "main p", found)?;
                expect::contains("welcome paragraph text", &paragraph.text(), text)?;
            }
            Ok(())
        });
    }

    section.case("uses semantic landmarks", |fx| {
        let doc = fx.document();
        for landmark in ["header", "main", "footer"] {
            let selector = format!("body > {landmark}");
            let found = doc.query_selector_all(&selector)?;
            expect::count(&format!("{landmark} landmark"), &selector, 1, &found)?;
        }
        Ok(())
    })
}

fn footer(spec: &PageSpec) -> Section {
    let section = Section::new("Footer");
    let Some(copyright) = spec.copyright.clone() else {
        return section;
    };
    section.case("shows the copyright", move |fx| {
        let found = fx.document().query_selector("footer")?;
        let footer = expect::present("footer", "footer", found)?;
        expect::contains("footer text", &footer.text(), &copyright)
    })
}

fn css_styles(spec: &PageSpec) -> Section {
    let mut section = Section::new("CSS Styles").case("embeds a stylesheet", |fx| {
        expect::contains("style start tag", fx.raw(), "<style>")?;
        expect::contains("style end tag", fx.raw(), "</style>")
    });

    let groups = [
        ("has layout styles", "layout style", &spec.styles.layout),
        ("has navigation styles", "navigation style", &spec.styles.navigation),
        ("has responsive styles", "responsive style", &spec.styles.responsive),
    ];
    for (name, expectation, tokens) in groups {
        if tokens.is_empty() {
            continue;
        }
        let tokens = tokens.clone();
        section = section.case(name, move |fx| raw_contains_all(fx, expectation, &tokens));
    }
    section
}

fn content_validation(spec: &PageSpec) -> Section {
    let mut section = Section::new("Content Validation")
        .case("has no empty or placeholder links", |fx| {
            for anchor in fx.document().query_selector_all("a")? {
                let expectation = format!("href of {}", anchor.snippet());
                let href = anchor.attr("href");
                expect::present_attr(&expectation, "href", href)?;
                let href = href.unwrap_or_default();
                expect::not_equal(&expectation, "", href)?;
                expect::not_equal(&expectation, "#", href)?;
            }
            Ok(())
        })
        .case("has a navigation list", |fx| {
            let found = fx.document().query_selector("nav")?;
            let nav = expect::present("navigation element", "nav", found)?;
            expect::present("navigation list", "nav ul", nav.query_selector("ul")?)?;
            expect::at_least("navigation items", "nav li", 1, &nav.query_selector_all("li")?)
        });

    if !spec.snippets.is_empty() {
        let snippets = spec.snippets.clone();
        section = section.case("contains the expected prose", move |fx| {
            raw_contains_all(fx, "page text", &snippets)
        });
    }
    section
}
