//! Binding engine
//!
//! Turns template content plus a context record into a live fragment:
//!
//! ```text
//! template(source, name) → Template
//! Template::evaluate(ctx):
//!   clone fragment → extract bindings → tree(ctx)
//!     for each binding: locate(path) → observe(refresh) → refresh once
//! ```
//!
//! After `evaluate` returns, every `Record::set` along a bound path
//! re-renders the affected nodes of every fragment built from that record.

use std::rc::Rc;
use tracing::{debug, instrument};

use crate::binding::extract;
use crate::context::Record;
use crate::dom::Node;
use crate::error::{Result, StacheError};
use crate::observer::{locate, tree, Observer};
use crate::source::TemplateSource;

/// A named template ready to be evaluated against contexts
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: Node,
}

/// Look up a template by name
pub fn template<S: TemplateSource + ?Sized>(source: &S, name: &str) -> Result<Template> {
    let content = source
        .template_content(name)
        .ok_or_else(|| StacheError::MissingTemplate {
            name: name.to_string(),
        })?;
    debug!(template = name, "resolved template");
    Ok(Template::new(name, content))
}

impl Template {
    pub fn new(name: impl Into<String>, content: Node) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Build a template directly from markup
    pub fn parse(name: impl Into<String>, markup: &str) -> Result<Self> {
        Ok(Self::new(name, Node::parse_fragment(markup)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render a fresh fragment bound to `context`
    ///
    /// The returned fragment already shows the current values. Observers
    /// hold the context weakly: once it is dropped they stop rendering.
    #[instrument(skip_all, fields(template = %self.name))]
    pub fn evaluate(&self, context: &Record) -> Result<Node> {
        let fragment = self.content.deep_clone();
        let bindings = extract(&fragment);
        let root = tree(context);
        debug!(bindings = bindings.len(), "binding fragment");

        for binding in bindings {
            let binding = Rc::new(binding);
            let leaf = locate(&root, context, binding.path());

            let weak = context.downgrade();
            let target = Rc::clone(&binding);
            let observer: Observer = Rc::new(move || match weak.upgrade() {
                Some(context) => target.refresh(&context),
                None => Ok(()),
            });
            leaf.observe(observer);

            binding.refresh(context)?;
        }

        Ok(fragment)
    }
}
