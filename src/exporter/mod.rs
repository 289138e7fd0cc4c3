//! Pattern documents and reports.
//!
//! Fields become `atomic_semantic_pattern` documents, models and
//! collections `composite_semantic_pattern` documents, and the project a
//! composite listing everything it holds.

pub use field::field_pattern;
pub use model::model_pattern;
pub use project::project_pattern;
pub use tree::{export_tree, TreeRoot};

pub mod pdf;

mod field;
mod model;
mod project;
mod tree;

use crate::{xml::Element, Result};

pub(crate) const AAT: &str = "http://vocab.getty.edu/aat/";
pub(crate) const ENGLISH: &str = "English";

/// A named XML document.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternDocument {
    /// File stem the document is stored under.
    pub name: String,
    pub root: Element,
}

impl PatternDocument {
    pub fn to_xml(&self) -> Result<String> {
        self.root.to_xml()
    }
}

/// `<name><uri>…</uri><label>…</label></name>`
pub(crate) fn term(name: &str, uri: &str, label: &str) -> Element {
    Element::new(name)
        .with_child(Element::leaf("uri", uri))
        .with_child(Element::leaf("label", label))
}

/// A term from the Getty AAT.
pub(crate) fn aat(name: &str, id: &str, label: &str) -> Element {
    term(name, &format!("{}{}", AAT, id), label)
}

/// A leaf whose text is empty when the value is missing.
pub(crate) fn leaf(name: &str, text: Option<&str>) -> Element {
    match text {
        Some(text) => Element::leaf(name, text),
        None => Element::new(name),
    }
}
