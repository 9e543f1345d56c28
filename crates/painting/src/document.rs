//! Attributed-tree documents
//!
//! A small element tree (tag, ordered string attributes, child elements)
//! used as the structured persistence form of brush settings. Hosts map it
//! onto whatever markup their document format uses.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentElement {
    tag: String,
    #[serde(default)]
    attributes: Vec<(String, String)>,
    #[serde(default)]
    children: Vec<DocumentElement>,
}

impl DocumentElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The default element has no tag and stands in for "no element"
    pub fn is_null(&self) -> bool {
        self.tag.is_empty()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Set an attribute, replacing an existing value with the same name
    pub fn set_attribute(&mut self, name: &str, value: impl Display) {
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn append_child(&mut self, child: DocumentElement) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[DocumentElement] {
        &self.children
    }

    /// Child elements with the given tag, in document order
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DocumentElement> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    pub fn first_child_named(&self, tag: &str) -> Option<&DocumentElement> {
        self.children.iter().find(|child| child.tag == tag)
    }
}
