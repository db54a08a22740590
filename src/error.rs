//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Crate-wide result alias
pub type Result<T, E = StacheError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum StacheError {
    // ─────────────────────────────────────────────────────────────
    // Rendering errors (STACHE-010 to STACHE-012)
    // ─────────────────────────────────────────────────────────────

    #[error("STACHE-010: No template named '{name}'")]
    MissingTemplate { name: String },

    #[error("STACHE-011: Callable at '{path}' failed: {source}")]
    Callable {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("STACHE-012: HTML parse error: {details}")]
    HtmlParse { details: String },

    // ─────────────────────────────────────────────────────────────
    // Context errors (STACHE-020 to STACHE-021)
    // ─────────────────────────────────────────────────────────────

    #[error("STACHE-020: Context root must be an object, got {found}")]
    InvalidContext { found: String },

    #[error("STACHE-021: Cannot assign '{assignment}': {reason}")]
    InvalidAssignment { assignment: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Environment errors
    // ─────────────────────────────────────────────────────────────

    #[error("STACHE-030: Config error: {reason}")]
    Config { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FixSuggestion for StacheError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            StacheError::MissingTemplate { .. } => {
                Some("Add a <template data-name=\"...\"> element with that name")
            }
            StacheError::Callable { .. } => Some("Fix the function bound at that path"),
            StacheError::HtmlParse { .. } => Some("Check that the document is valid UTF-8 HTML"),
            StacheError::InvalidContext { .. } => {
                Some("Wrap the context values in a top-level object: {\"name\": ...}")
            }
            StacheError::InvalidAssignment { .. } => {
                Some("Use path=value, e.g. --set user.name='\"Bender\"'")
            }
            StacheError::Config { .. } => Some("Check stache.yaml syntax: namespace, template_attribute"),
            StacheError::Io(_) => Some("Check file path and permissions"),
            StacheError::Json(_) => Some("Check JSON syntax of the context file"),
            StacheError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
        }
    }
}
