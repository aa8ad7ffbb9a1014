use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::{Error, Result};

/// Source of page text, handed to the runner explicitly.
pub trait PageLoader {
    fn load(&self, filename: &str) -> Result<String>;
}

/// Reads pages from a directory on disk. Every call hits the filesystem so
/// checks always see the current file contents.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let relative = Path::new(filename);
        let inside_root = !filename.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !inside_root {
            return Err(Error::PathOutsideRoot(filename.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl PageLoader for FsLoader {
    fn load(&self, filename: &str) -> Result<String> {
        let path = self.resolve(filename)?;
        debug!(path = %path.display(), "loading page");
        fs::read_to_string(&path).map_err(|source| Error::Load { path, source })
    }
}

/// In-memory pages, keyed by filename.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    pages: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, filename: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(filename, html);
        self
    }

    pub fn insert(&mut self, filename: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(filename.into(), html.into());
    }
}

impl PageLoader for MemoryLoader {
    fn load(&self, filename: &str) -> Result<String> {
        self.pages
            .get(filename)
            .cloned()
            .ok_or_else(|| Error::Load {
                path: PathBuf::from(filename),
                source: io::Error::new(io::ErrorKind::NotFound, "no such page"),
            })
    }
}

/// Lists the page files directly inside `root` whose extension is one of
/// `extensions` (compared case-insensitively, without the dot).
pub fn discover_pages(root: &Path, extensions: &[String]) -> Result<Vec<String>> {
    let entries = fs::read_dir(root).map_err(|source| Error::Load {
        path: root.to_path_buf(),
        source,
    })?;

    let mut pages = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::Load {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
            });
        if !recognized {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            pages.push(name.to_string());
        }
    }
    pages.sort();
    debug!(root = %root.display(), count = pages.len(), "discovered pages");
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fresh_contents_on_every_call() -> Result<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("home.html"), "<p>one</p>").expect("write");
        let loader = FsLoader::new(dir.path());

        let first = loader.load("home.html")?;
        assert_eq!(first, loader.load("home.html")?);

        fs::write(dir.path().join("home.html"), "<p>two</p>").expect("rewrite");
        assert_eq!(loader.load("home.html")?, "<p>two</p>");
        Ok(())
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FsLoader::new(dir.path())
            .load("missing.html")
            .expect_err("file does not exist");
        match &err {
            Error::Load { path, source } => {
                assert!(path.ends_with("missing.html"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("could not load "));
        assert!(err.is_fatal());
    }

    #[test]
    fn rejects_paths_leaving_the_root() {
        let loader = FsLoader::new("site");
        for filename in ["../secret.html", "/etc/passwd", "a/../../b.html", ""] {
            assert!(
                matches!(loader.load(filename), Err(Error::PathOutsideRoot(_))),
                "{filename} should be rejected"
            );
        }
    }

    #[test]
    fn memory_loader_serves_inserted_pages() -> Result<()> {
        let loader = MemoryLoader::new().with_page("home.html", "<title>x</title>");
        assert_eq!(loader.load("home.html")?, "<title>x</title>");
        assert!(matches!(loader.load("about.html"), Err(Error::Load { .. })));
        Ok(())
    }

    #[test]
    fn discovers_recognized_extensions_sorted() -> Result<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["projects.html", "about.HTML", "notes.txt", "home.html"] {
            fs::write(dir.path().join(name), "").expect("write");
        }
        fs::create_dir(dir.path().join("nested.html")).expect("mkdir");

        let pages = discover_pages(dir.path(), &["html".to_string()])?;
        assert_eq!(pages, vec!["about.HTML", "home.html", "projects.html"]);

        let dotted = discover_pages(dir.path(), &[".txt".to_string()])?;
        assert_eq!(dotted, vec!["notes.txt"]);
        Ok(())
    }
}
