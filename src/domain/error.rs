//! Recoverable analysis issues.
//!
//! None of these abort a pass. Each one means "no relationship recorded" for the slot it names;
//! the analyzer keeps them so consumers can show why an entity has fewer edges than expected.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum AnalysisIssue {
    /// The entity was not loaded from retrievable text (stub or native unit).
    #[error("no retrievable source for `{entity}`")]
    MissingSource { entity: String },

    /// The source text exists but does not form a valid syntax tree.
    #[error("failed to parse source of `{entity}`: {reason}")]
    ParseFailure { entity: String, reason: String },

    /// An annotation was present but rendered to empty text.
    #[error("annotation of `{entity}` ({slot}) cannot be rendered to text")]
    UnresolvableAnnotation { entity: String, slot: String },
}

impl AnalysisIssue {
    pub fn entity(&self) -> &str {
        match self {
            AnalysisIssue::MissingSource { entity }
            | AnalysisIssue::ParseFailure { entity, .. }
            | AnalysisIssue::UnresolvableAnnotation { entity, .. } => entity,
        }
    }
}
