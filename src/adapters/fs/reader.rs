use crate::domain::ports::SourceReader;
use anyhow::{Context, Result};
use std::path::Path;

/// Reads source units from the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSourceReader;

impl FileSourceReader {
    pub fn new() -> Self {
        Self
    }
}

impl SourceReader for FileSourceReader {
    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_existing_and_missing_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("shapes.py");
        std::fs::write(&path, "class Shape: ...\n").unwrap();

        let reader = FileSourceReader::new();
        assert_eq!(reader.read(&path).unwrap(), "class Shape: ...\n");

        let err = reader.read(&tmp.path().join("absent.py")).unwrap_err();
        assert!(err.to_string().contains("absent.py"));
    }
}
