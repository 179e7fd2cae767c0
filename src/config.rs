//! Analysis options, loaded from an optional JSON file and overridden by CLI flags.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOptions {
    /// Collect `_private` names and enumerate `_private` methods.
    pub include_private: bool,
    /// Methods always enumerated on a type, even when inherited.
    pub lifecycle_hooks: Vec<String>,
    /// Bases that every type implicitly has; never reported.
    pub universal_roots: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_private: false,
            lifecycle_hooks: vec!["__init__".to_string(), "__call__".to_string()],
            universal_roots: vec!["object".to_string()],
        }
    }
}

impl AnalysisOptions {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
