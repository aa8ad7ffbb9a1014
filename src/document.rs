use std::fmt;

use crate::html::parse_html;
use crate::{Dom, NodeId, Result, has_class, truncate_chars};

/// A parsed page: the raw source text plus its element tree.
///
/// Every query borrows the document immutably; there is no way to mutate
/// the tree once it has been parsed.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    dom: Dom,
}

impl Document {
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let dom = parse_html(&source)?;
        Ok(Self { source, dom })
    }

    /// The raw text the document was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lower-cased doctype name, e.g. `html` for `<!DOCTYPE html>`.
    pub fn doctype(&self) -> Option<&str> {
        self.dom.doctype()
    }

    pub fn title(&self) -> Result<Option<String>> {
        Ok(self
            .query_selector("title")?
            .map(|title| title.trimmed_text()))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementRef<'_>>> {
        let found = self.dom.query_selector_from(self.dom.root(), selector)?;
        Ok(found.map(|id| ElementRef { doc: self, id }))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let found = self.dom.query_selector_all_from(self.dom.root(), selector)?;
        Ok(found
            .into_iter()
            .map(|id| ElementRef { doc: self, id })
            .collect())
    }
}

/// A borrowed handle to one element of a [`Document`].
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn tag_name(&self) -> &'a str {
        self.doc.dom.tag_name(self.id).unwrap_or_default()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.doc.dom.attr(self.id, name)
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.doc
            .dom
            .element(self.id)
            .is_some_and(|element| has_class(element, class_name))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        self.doc.dom.text_content(self.id)
    }

    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    pub fn parent(&self) -> Option<ElementRef<'a>> {
        let parent = self.doc.dom.parent(self.id)?;
        self.doc.dom.element(parent)?;
        Some(ElementRef {
            doc: self.doc,
            id: parent,
        })
    }

    pub fn children(&self) -> Vec<ElementRef<'a>> {
        self.doc
            .dom
            .element_children(self.id)
            .into_iter()
            .map(|id| ElementRef { doc: self.doc, id })
            .collect()
    }

    pub fn matches(&self, selector: &str) -> Result<bool> {
        self.doc.dom.matches_selector(self.id, selector)
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<ElementRef<'a>>> {
        let found = self.doc.dom.query_selector_from(self.id, selector)?;
        Ok(found.map(|id| ElementRef { doc: self.doc, id }))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementRef<'a>>> {
        let found = self.doc.dom.query_selector_all_from(self.id, selector)?;
        Ok(found
            .into_iter()
            .map(|id| ElementRef { doc: self.doc, id })
            .collect())
    }

    pub fn outer_html(&self) -> String {
        self.doc.dom.dump_node(self.id)
    }

    /// Serialized markup cut down for failure messages.
    pub fn snippet(&self) -> String {
        truncate_chars(&self.outer_html(), 200)
    }
}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for ElementRef<'_> {}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementRef").field(&self.snippet()).finish()
    }
}
