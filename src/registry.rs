//! Template registry
//!
//! `install` resolves every template a source knows and hands the result
//! back as a `Registry` value, named after the namespace it stands for
//! (`Templates` unless overridden).

use indexmap::IndexMap;
use tracing::debug;

use crate::context::Record;
use crate::dom::Node;
use crate::engine::{template, Template};
use crate::error::{Result, StacheError};
use crate::source::TemplateSource;

/// Namespace name used by [`install`]
pub const DEFAULT_NAMESPACE: &str = "Templates";

/// Name → template mapping produced by [`install`]
#[derive(Debug, Clone)]
pub struct Registry {
    namespace: String,
    templates: IndexMap<String, Template>,
}

/// Install every template of `source` under the default namespace
pub fn install<S: TemplateSource + ?Sized>(source: &S) -> Result<Registry> {
    install_as(source, DEFAULT_NAMESPACE)
}

/// Install every template of `source` under a custom namespace
pub fn install_as<S: TemplateSource + ?Sized>(source: &S, namespace: &str) -> Result<Registry> {
    let mut templates = IndexMap::new();
    for name in source.template_names() {
        let resolved = template(source, &name)?;
        templates.insert(name, resolved);
    }
    debug!(namespace, count = templates.len(), "installed templates");
    Ok(Registry {
        namespace: namespace.to_string(),
        templates,
    })
}

impl Registry {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Evaluate a registered template by name
    pub fn evaluate(&self, name: &str, context: &Record) -> Result<Node> {
        self.get(name)
            .ok_or_else(|| StacheError::MissingTemplate {
                name: name.to_string(),
            })?
            .evaluate(context)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
