//! Mock implementations for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use entity_relations::domain::ports::{CallSite, CallSiteParser, SourceReader};

/// Mock CallSiteParser: scripted answers per exact source text, empty otherwise.
pub struct MockCallParser {
    answers: HashMap<String, std::result::Result<Vec<CallSite>, String>>,
}

impl MockCallParser {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
        }
    }

    pub fn with_calls(mut self, source: &str, calls: Vec<CallSite>) -> Self {
        self.answers.insert(source.to_string(), Ok(calls));
        self
    }

    pub fn with_failure(mut self, source: &str, reason: &str) -> Self {
        self.answers
            .insert(source.to_string(), Err(reason.to_string()));
        self
    }
}

impl Default for MockCallParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CallSiteParser for MockCallParser {
    fn call_sites(&self, source: &str) -> std::result::Result<Vec<CallSite>, String> {
        self.answers.get(source).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn bare(name: &str) -> CallSite {
    CallSite::Bare(name.to_string())
}

pub fn attr(receiver: &str, attribute: &str) -> CallSite {
    CallSite::Attribute {
        receiver: receiver.to_string(),
        attribute: attribute.to_string(),
    }
}

/// Mock SourceReader that serves content from an in-memory map.
pub struct MockSourceReader {
    files: HashMap<PathBuf, String>,
}

impl MockSourceReader {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), content.into());
        self
    }
}

impl Default for MockSourceReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceReader for MockSourceReader {
    fn read(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("File not found: {}", path.display()))
    }
}
