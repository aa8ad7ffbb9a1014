use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Harness settings, usually read from `page-tester.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory holding the pages. Relative paths are resolved against the
    /// directory of the config file.
    pub root: PathBuf,
    /// File extensions recognized as pages when none are listed explicitly.
    pub extensions: Vec<String>,
    pub pages: Vec<PageSpec>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: vec!["html".to_string()],
            pages: Vec::new(),
        }
    }
}

impl HarnessConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })?;
        if config.root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.root = base.join(&config.root);
        }
        Ok(config)
    }

    fn from_toml_str(raw: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(raw).map_err(|err| err.to_string())?;
        if config.extensions.is_empty() {
            return Err("at least one page extension is required".into());
        }
        for page in &config.pages {
            if page.file.trim().is_empty() {
                return Err("page entry with an empty `file`".into());
            }
        }
        Ok(config)
    }
}

/// Expectations for a single page. Only `file` is required; every other
/// field adds the cases that check it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSpec {
    pub file: String,
    pub title: Option<String>,
    pub heading: Option<String>,
    pub subtitle: Option<String>,
    pub welcome_heading: Option<String>,
    pub welcome_text: Option<String>,
    pub copyright: Option<String>,
    pub nav: Vec<NavLink>,
    pub styles: StyleExpectations,
    pub snippets: Vec<String>,
}

impl PageSpec {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavLink {
    pub href: String,
    pub text: String,
}

/// Raw-text tokens expected in the embedded stylesheet, grouped the way the
/// CSS cases report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleExpectations {
    pub layout: Vec<String>,
    pub navigation: Vec<String>,
    pub responsive: Vec<String>,
}
