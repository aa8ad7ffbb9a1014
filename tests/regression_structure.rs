use page_tester::{
    CaseState, Error, MemoryLoader, NavLink, PageSpec, Runner, Section, Suite, build_suite,
};

const HOME: &str = include_str!("../site/home.html");

fn home_spec() -> PageSpec {
    let mut spec = PageSpec::new("home.html");
    spec.title = Some("My Portfolio".into());
    spec.heading = Some("Leo Ọládimú".into());
    spec.subtitle = Some("Software Developer".into());
    spec.welcome_heading = Some("Welcome!".into());
    spec.welcome_text = Some("I'm Leo Ọládimú, a developer and designer".into());
    spec.copyright = Some("© 2026 Leo Ọládimú".into());
    spec.nav = [
        ("home.html", "Home"),
        ("about.html", "About"),
        ("projects.html", "Projects"),
    ]
    .into_iter()
    .map(|(href, text)| NavLink {
        href: href.into(),
        text: text.into(),
    })
    .collect();
    spec.styles.layout = vec!["display: flex".into()];
    spec.styles.navigation = vec!["nav {".into(), "width: 180px".into(), "background: #222".into()];
    spec.styles.responsive = vec!["max-width: 600px".into(), "min-height: 100vh".into()];
    spec.snippets = vec![
        "passionate about building elegant".into(),
        "human-centered digital experiences".into(),
    ];
    spec
}

fn run_home(html: &str) -> page_tester::Result<page_tester::Report> {
    let loader = MemoryLoader::new().with_page("home.html", html);
    Runner::new(&loader).run(&[build_suite(&home_spec())])
}

#[test]
fn unmodified_page_passes() -> page_tester::Result<()> {
    let report = run_home(HOME)?;
    assert!(report.all_passed(), "{}", report.render_human());
    let css_cases = report.suites[0]
        .outcomes
        .iter()
        .filter(|outcome| outcome.section == "CSS Styles")
        .count();
    assert_eq!(css_cases, 4);
    Ok(())
}

#[test]
fn missing_style_tokens_and_prose_are_reported() -> page_tester::Result<()> {
    let page = HOME
        .replace("min-height: 100vh", "min-height: 90vh")
        .replace("human-centered", "human centred");
    let report = run_home(&page)?;
    let failures = report
        .failures()
        .iter()
        .map(|failure| (failure.case, failure.expected))
        .collect::<Vec<_>>();
    assert_eq!(
        failures,
        vec![
            ("has responsive styles", "text containing \"min-height: 100vh\""),
            ("contains the expected prose", "text containing \"human-centered digital experiences\""),
        ]
    );
    Ok(())
}

#[test]
fn wrong_title_reports_expected_and_actual() -> page_tester::Result<()> {
    let page = HOME.replace("<title>My Portfolio</title>", "<title>Portfolio</title>");
    let report = run_home(&page)?;
    assert_eq!(report.exit_code(), 1);

    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].section, "Document Structure");
    assert_eq!(failures[0].case, "has the expected title");
    assert_eq!(failures[0].expectation, "title markup");
    assert!(failures[0].expected.contains("<title>My Portfolio</title>"));
    Ok(())
}

#[test]
fn every_failing_case_is_listed() -> page_tester::Result<()> {
    let page = HOME
        .replace("© 2026", "(c) 2026")
        .replace(r#"<a href="about.html">"#, r##"<a href="#">"##)
        .replace("display: flex;", "display: grid;");
    let report = run_home(&page)?;

    let failed = report
        .failures()
        .iter()
        .map(|failure| failure.case)
        .collect::<Vec<_>>();
    assert_eq!(
        failed,
        vec![
            "links each page with the right label",
            "shows the copyright",
            "has layout styles",
            "has no empty or placeholder links",
        ]
    );
    assert_eq!(report.failed(), 4);
    assert_eq!(report.passed(), report.total() - 4);
    Ok(())
}

#[test]
fn second_active_link_is_rejected() -> page_tester::Result<()> {
    let page = HOME.replace(
        r#"<a href="about.html">"#,
        r#"<a href="about.html" class="active">"#,
    );
    let report = run_home(&page)?;
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].expectation, "active link");
    assert!(failures[0].actual.starts_with("2 elements, first: <a "));
    Ok(())
}

#[test]
fn duplicated_landmark_is_rejected() -> page_tester::Result<()> {
    let page = HOME.replace("</body>", "<footer>again</footer></body>");
    let report = run_home(&page)?;
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].case, "uses semantic landmarks");
    assert_eq!(failures[0].expectation, "footer landmark");
    Ok(())
}

#[test]
fn decomposed_copyright_still_matches() -> page_tester::Result<()> {
    let page = HOME.replace("© 2026 Leo Ọládimú", "© 2026 Leo O\u{323}la\u{301}dimu\u{301}");
    let report = run_home(&page)?;
    let footer = report.suites[0]
        .outcomes
        .iter()
        .find(|outcome| outcome.section == "Footer")
        .expect("footer case declared");
    assert_eq!(footer.state, CaseState::Passed);
    Ok(())
}

#[test]
fn missing_page_aborts_with_load_error() {
    let loader = MemoryLoader::new();
    let err = Runner::new(&loader)
        .run(&[build_suite(&home_spec())])
        .expect_err("home.html is not loaded");
    assert!(matches!(err, Error::Load { .. }));
    assert!(err.to_string().starts_with("could not load home.html"));
}

#[test]
fn abort_discards_results_of_earlier_suites() {
    let loader = MemoryLoader::new().with_page("home.html", HOME);
    let suites = [
        build_suite(&home_spec()),
        build_suite(&PageSpec::new("about.html")),
    ];
    let err = Runner::new(&loader)
        .run(&suites)
        .expect_err("about.html is not loaded");
    assert!(err.is_fatal());
}

#[test]
fn check_errors_fail_only_their_case() -> page_tester::Result<()> {
    let loader = MemoryLoader::new().with_page("home.html", HOME);
    let suite = Suite::new("Custom", "home.html").section(
        Section::new("Selectors")
            .case("uses an unsupported selector", |fx| {
                fx.document().query_selector("a:hover")?;
                Ok(())
            })
            .case("uses a broken pattern", |fx| {
                page_tester::expect::matches("doctype", fx.raw(), "/(/")
            })
            .case("finds the heading", |fx| {
                let h1 = fx.document().query_selector("main > h1")?;
                page_tester::expect::present("heading", "main > h1", h1).map(|_| ())
            }),
    );
    let report = Runner::new(&loader).run(&[suite])?;
    let states = report.suites[0]
        .outcomes
        .iter()
        .map(|outcome| outcome.state.is_passed())
        .collect::<Vec<_>>();
    assert_eq!(states, vec![false, false, true]);
    Ok(())
}
