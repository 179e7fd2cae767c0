use crate::domain::entity::CollectedUnit;
use anyhow::Result;
use std::path::Path;

/// Entity collector port (implemented by Infrastructure)
pub trait EntityCollector {
    fn collect(&self) -> Result<CollectedUnit>;
}

/// Source code reader port
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String>;
}

/// A call expression whose callee has a shape the scanner can resolve.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CallSite {
    /// `name(...)`
    Bare(String),
    /// `receiver.attribute(...)` where the receiver is a bare identifier
    Attribute { receiver: String, attribute: String },
}

/// Syntax-tree port: turns source text into the call sites it contains.
///
/// `Err` carries a human-readable reason; callers treat it as a parse failure.
pub trait CallSiteParser: Send + Sync {
    fn call_sites(&self, source: &str) -> std::result::Result<Vec<CallSite>, String>;
}
