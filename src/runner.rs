use serde::Serialize;
use tracing::{debug, info, warn};

use crate::report::{Report, SuiteReport};
use crate::{Document, Error, PageLoader, Result};

/// Fresh per-case state: the page text and a parse of it that nothing else
/// shares.
#[derive(Debug)]
pub struct Fixture {
    page: String,
    document: Document,
}

impl Fixture {
    pub fn load(loader: &dyn PageLoader, page: &str) -> Result<Self> {
        let raw = loader.load(page)?;
        let document = Document::parse(raw)?;
        Ok(Self {
            page: page.to_string(),
            document,
        })
    }

    /// Filename of the page under test.
    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn raw(&self) -> &str {
        self.document.source()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

type Check = Box<dyn Fn(&Fixture) -> Result<()> + Send + Sync>;

pub struct Case {
    name: String,
    check: Check,
}

impl Case {
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&Fixture) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Case {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Case").field("name", &self.name).finish()
    }
}

#[derive(Debug)]
pub struct Section {
    name: String,
    cases: Vec<Case>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    pub fn case(
        mut self,
        name: impl Into<String>,
        check: impl Fn(&Fixture) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.cases.push(Case::new(name, check));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }
}

/// All sections declared for one page.
#[derive(Debug)]
pub struct Suite {
    name: String,
    page: String,
    sections: Vec<Section>,
}

impl Suite {
    pub fn new(name: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page: page.into(),
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, section: Section) -> Self {
        if !section.cases.is_empty() {
            self.sections.push(section);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn case_count(&self) -> usize {
        self.sections.iter().map(|section| section.cases.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CaseState {
    Pending,
    Running,
    Passed,
    Failed {
        expectation: String,
        expected: String,
        actual: String,
    },
}

impl CaseState {
    fn start(&mut self) {
        debug_assert_eq!(*self, Self::Pending);
        *self = Self::Running;
    }

    fn finish(&mut self, case: &str, result: Result<()>) {
        debug_assert_eq!(*self, Self::Running);
        *self = match result {
            Ok(()) => Self::Passed,
            Err(Error::AssertionFailed {
                expectation,
                expected,
                actual,
            }) => Self::Failed {
                expectation,
                expected,
                actual,
            },
            Err(err) => Self::Failed {
                expectation: case.to_string(),
                expected: "check to run to completion".into(),
                actual: err.to_string(),
            },
        };
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed { .. })
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    pub section: String,
    pub name: String,
    #[serde(flatten)]
    pub state: CaseState,
}

/// Runs suites against pages obtained from an injected loader.
pub struct Runner<'a> {
    loader: &'a dyn PageLoader,
}

impl<'a> Runner<'a> {
    pub fn new(loader: &'a dyn PageLoader) -> Self {
        Self { loader }
    }

    /// Runs every case of `suite`. A page that cannot be loaded or parsed
    /// aborts with that error; failing checks are recorded and the run
    /// continues.
    pub fn run_suite(&self, suite: &Suite) -> Result<SuiteReport> {
        info!(suite = %suite.name, page = %suite.page, cases = suite.case_count(), "running suite");
        let mut outcomes = Vec::with_capacity(suite.case_count());

        for section in &suite.sections {
            for case in &section.cases {
                let mut state = CaseState::Pending;
                state.start();
                let result = match Fixture::load(self.loader, &suite.page)
                    .and_then(|fixture| (case.check)(&fixture))
                {
                    Err(err) if err.is_fatal() => {
                        warn!(page = %suite.page, error = %err, "aborting run");
                        return Err(err);
                    }
                    result => result,
                };
                state.finish(&case.name, result);

                match &state {
                    CaseState::Failed { expectation, .. } => {
                        warn!(section = %section.name, case = %case.name, %expectation, "case failed");
                    }
                    _ => debug!(section = %section.name, case = %case.name, "case passed"),
                }

                outcomes.push(CaseOutcome {
                    section: section.name.clone(),
                    name: case.name.clone(),
                    state,
                });
            }
        }

        let report = SuiteReport {
            name: suite.name.clone(),
            page: suite.page.clone(),
            outcomes,
        };
        info!(
            suite = %report.name,
            passed = report.passed(),
            failed = report.failed(),
            "suite finished"
        );
        Ok(report)
    }

    pub fn run(&self, suites: &[Suite]) -> Result<Report> {
        let mut report = Report::default();
        for suite in suites {
            report.suites.push(self.run_suite(suite)?);
        }
        Ok(report)
    }
}
