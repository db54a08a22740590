//! Stache Configuration
//!
//! Loaded from `stache.yaml` in the working directory (or an explicit path).
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. CLI flags
//! 2. Environment variables (`STACHE_NAMESPACE`, `STACHE_TEMPLATE_ATTRIBUTE`)
//! 3. Config file
//! 4. Defaults

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StacheError};
use crate::registry::DEFAULT_NAMESPACE;
use crate::source::DEFAULT_TEMPLATE_ATTRIBUTE;

/// Default config file name
pub const CONFIG_FILE: &str = "stache.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StacheConfig {
    /// Name the installed registry is exposed under
    pub namespace: String,

    /// Attribute carrying a template's name
    pub template_attribute: String,
}

impl Default for StacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            template_attribute: DEFAULT_TEMPLATE_ATTRIBUTE.to_string(),
        }
    }
}

impl StacheConfig {
    /// `./stache.yaml`
    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    /// Load from a file
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| StacheError::Config {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;

        Self::parse(&content)
    }

    /// Parse YAML; missing keys take their defaults
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| StacheError::Config {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Merge with environment variables
    pub fn with_env(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(namespace) = lookup("STACHE_NAMESPACE").filter(|v| !v.is_empty()) {
            self.namespace = namespace;
        }
        if let Some(attribute) = lookup("STACHE_TEMPLATE_ATTRIBUTE").filter(|v| !v.is_empty()) {
            self.template_attribute = attribute;
        }
        self
    }
}
