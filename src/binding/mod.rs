//! Binding Module - links rendered locations to context paths
//!
//! - `extract`: walks a cloned fragment and produces the binding list
//! - `Binding`: one rendered location plus the dotted path it shows
//!
//! Data flow:
//! ```text
//! cloned fragment → extract (tokenize attributes + text runs)
//!                        ↓
//!            Vec<Binding> (text node | attribute, path)
//!                        ↓
//!        Binding::refresh(context) → pluck → escaped value written
//! ```

mod extract;

pub use extract::extract;

use std::fmt;

use crate::context::Record;
use crate::dom::{Attr, Node};
use crate::error::Result;
use crate::path::pluck;

/// Where a resolved value is written
#[derive(Clone)]
pub enum Target {
    /// A text node created for one expression token
    Text(Node),
    /// An attribute whose value holds at least one expression
    Attribute(Attr),
}

/// A rendered location bound to a dotted path
#[derive(Clone)]
pub struct Binding {
    target: Target,
    path: String,
}

impl Binding {
    pub fn new(target: Target, path: impl Into<String>) -> Self {
        Self {
            target,
            path: path.into(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Re-resolve the full path from the context root and write the result
    ///
    /// Attribute bindings overwrite the whole attribute value with their own
    /// resolved value, even when the attribute holds several expressions.
    pub fn refresh(&self, context: &Record) -> Result<()> {
        let value = pluck(context, &self.path)?;
        match &self.target {
            Target::Text(node) => node.set_text(&value),
            Target::Attribute(attr) => attr.set_value(&value),
        }
        Ok(())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            Target::Text(_) => "text".to_string(),
            Target::Attribute(attr) => format!("@{}", attr.name()),
        };
        f.debug_struct("Binding")
            .field("target", &target)
            .field("path", &self.path)
            .finish()
    }
}
