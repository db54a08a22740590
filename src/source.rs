//! Template sources
//!
//! A source answers two questions: the content of a named template, and the
//! names of all templates it knows. `TemplateSet` is the in-memory source,
//! filled from `<template data-name="...">` elements of an HTML document or
//! from individual markup strings.

use indexmap::IndexMap;
use tracing::debug;

use crate::dom::{collect_templates, parse_html, rc_attribute, template_fragment, Node};
use crate::error::Result;

/// Attribute naming a template element
pub const DEFAULT_TEMPLATE_ATTRIBUTE: &str = "data-name";

/// Lookup of template content by name
pub trait TemplateSource {
    /// Content fragment of the named template (the engine clones it)
    fn template_content(&self, name: &str) -> Option<Node>;

    /// Every known template name, in discovery order
    fn template_names(&self) -> Vec<String>;
}

/// In-memory template source
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: IndexMap<String, Node>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `<template data-name="...">` of a document
    pub fn from_document(html: &str) -> Result<Self> {
        Self::from_document_with(html, DEFAULT_TEMPLATE_ATTRIBUTE)
    }

    /// Same as [`TemplateSet::from_document`] with a custom name attribute
    ///
    /// Templates without the attribute are skipped; on duplicate names the
    /// first one in document order wins.
    pub fn from_document_with(html: &str, attribute: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        let mut found = Vec::new();
        collect_templates(&dom.document, &mut found);

        let mut set = Self::new();
        for handle in &found {
            let Some(name) = rc_attribute(handle, attribute) else {
                continue;
            };
            if set.templates.contains_key(&name) {
                debug!(template = %name, "duplicate template name ignored");
                continue;
            }
            set.templates.insert(name, template_fragment(handle));
        }

        debug!(count = set.len(), attribute, "loaded templates from document");
        Ok(set)
    }

    /// Add (or replace) a template from markup
    pub fn insert(&mut self, name: impl Into<String>, markup: &str) -> Result<()> {
        let fragment = Node::parse_fragment(markup)?;
        self.templates.insert(name.into(), fragment);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateSource for TemplateSet {
    fn template_content(&self, name: &str) -> Option<Node> {
        self.templates.get(name).cloned()
    }

    fn template_names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }
}
