//! Structural test harness for static HTML pages.
//!
//! Pages are loaded through a [`PageLoader`], parsed into a small in-memory
//! DOM and checked by a [`Runner`] that executes every declared case against
//! a fresh [`Fixture`].

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

mod config;
mod document;
mod dom;
pub mod expect;
mod html;
mod loader;
mod pattern;
mod report;
mod runner;
mod selector;
mod suite;

pub use config::{HarnessConfig, NavLink, PageSpec, StyleExpectations};
pub use document::{Document, ElementRef};
pub use loader::{FsLoader, MemoryLoader, PageLoader, discover_pages};
pub use report::{Failure, OutputFormat, Report, SuiteReport};
pub use runner::{Case, CaseOutcome, CaseState, Fixture, Runner, Section, Suite};
pub use suite::{build_site_suites, build_suite};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not load {path}: {source}", path = .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("page path escapes the page root: {0}")]
    PathOutsideRoot(String),
    #[error("invalid config {path}: {message}", path = .path.display())]
    Config { path: PathBuf, message: String },
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("invalid pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("{expectation}: expected {expected}, actual {actual}")]
    AssertionFailed {
        expectation: String,
        expected: String,
        actual: String,
    },
}

impl Error {
    /// Errors that leave no usable fixture and therefore abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Load { .. } | Self::PathOutsideRoot(_) | Self::Config { .. } | Self::HtmlParse(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    tag_name: String,
    attrs: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, Vec<NodeId>>,
    doctype: Option<String>,
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut it = value.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        let Some(ch) = it.next() else {
            return out;
        };
        out.push(ch);
    }
    if it.next().is_some() {
        out.push_str("...");
    }
    out
}
