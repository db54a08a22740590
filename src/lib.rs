//! Stache Bind - live `{{ path }}` data binding for HTML templates
//!
//! Templates are rendered against a `Record`; writes made later through
//! `Record::set` re-render the affected text nodes and attributes of every
//! fragment built from that record, with no re-render call.
//!
//! ```
//! use stache_bind::{Record, Template};
//!
//! let simple = Template::parse("simple", "<p>{{ name }}</p>").unwrap();
//! let user = Record::new().with("name", "Hubot");
//! let fragment = simple.evaluate(&user).unwrap();
//! assert_eq!(fragment.text_content(), "Hubot");
//!
//! user.set("name", "Bender").unwrap();
//! assert_eq!(fragment.text_content(), "Bender");
//! ```

pub mod binding;
pub mod config;
pub mod context;
pub mod dom;
pub mod engine;
pub mod error;
pub mod observer;
pub mod path;
pub mod registry;
pub mod source;
pub mod template;

pub use binding::{Binding, Target};
pub use config::StacheConfig;
pub use context::{Record, Value};
pub use dom::{Attr, Node, NodeKind};
pub use engine::{template, Template};
pub use error::{FixSuggestion, StacheError};
pub use observer::{ObserverNode, ObserverTrees};
pub use registry::{install, install_as, Registry};
pub use source::{TemplateSet, TemplateSource};
pub use template::{tokenize, Token, TokenKind};
