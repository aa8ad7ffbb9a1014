use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;

use crate::runner::{CaseOutcome, CaseState};

/// How a [`Report`] is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Sections and per-case marks followed by a summary
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub page: String,
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.state.is_passed())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }
}

/// A failing case together with the suite it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure<'a> {
    pub suite: &'a str,
    pub section: &'a str,
    pub case: &'a str,
    pub expectation: &'a str,
    pub expected: &'a str,
    pub actual: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub suites: Vec<SuiteReport>,
}

impl Report {
    pub fn total(&self) -> usize {
        self.suites.iter().map(|suite| suite.outcomes.len()).sum()
    }

    pub fn passed(&self) -> usize {
        self.suites.iter().map(SuiteReport::passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }

    /// Every failing case in declaration order.
    pub fn failures(&self) -> Vec<Failure<'_>> {
        let mut failures = Vec::new();
        for suite in &self.suites {
            for outcome in &suite.outcomes {
                if let CaseState::Failed {
                    expectation,
                    expected,
                    actual,
                } = &outcome.state
                {
                    failures.push(Failure {
                        suite: &suite.name,
                        section: &outcome.section,
                        case: &outcome.name,
                        expectation,
                        expected,
                        actual,
                    });
                }
            }
        }
        failures
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Human => Ok(self.render_human()),
            OutputFormat::Json => self.render_json(),
        }
    }

    pub fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Running Portfolio Tests");
        let _ = writeln!(out, "=======================");

        for suite in &self.suites {
            let _ = writeln!(out);
            let _ = writeln!(out, "{} ({})", suite.name, suite.page);
            let mut section = None;
            for outcome in &suite.outcomes {
                if section != Some(outcome.section.as_str()) {
                    section = Some(outcome.section.as_str());
                    let _ = writeln!(out, "  {}", outcome.section);
                }
                match &outcome.state {
                    CaseState::Passed => {
                        let _ = writeln!(out, "    ✓ {}", outcome.name);
                    }
                    CaseState::Failed {
                        expected, actual, ..
                    } => {
                        let _ = writeln!(out, "    ✗ {}", outcome.name);
                        let _ = writeln!(out, "        expected: {expected}");
                        let _ = writeln!(out, "        actual:   {actual}");
                    }
                    CaseState::Pending | CaseState::Running => {
                        let _ = writeln!(out, "    ? {}", outcome.name);
                    }
                }
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} passed, {} failed, {} total",
            self.passed(),
            self.failed(),
            self.total()
        );
        if self.all_passed() {
            let _ = writeln!(out, "All tests passed successfully!");
        } else {
            let _ = writeln!(out, "Some tests failed:");
            for failure in self.failures() {
                let _ = writeln!(
                    out,
                    "  {} > {} > {}: {}",
                    failure.suite, failure.section, failure.case, failure.expectation
                );
            }
        }
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Summary<'a> {
            passed: usize,
            failed: usize,
            total: usize,
            suites: &'a [SuiteReport],
        }

        let summary = Summary {
            passed: self.passed(),
            failed: self.failed(),
            total: self.total(),
            suites: &self.suites,
        };
        serde_json::to_string_pretty(&summary)
    }
}
