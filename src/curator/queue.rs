// Pending URL list persisted as plain text, one URL per line
//
// Duplicate lines are kept as-is; deduplication happens in the collection
// once a URL resolves to entries.

use std::fs;
use std::path::{Path, PathBuf};

use super::collection::CollectionStore;
use super::errors::Result;

#[derive(Debug, Clone)]
pub struct UrlQueue {
    path: PathBuf,
}

impl UrlQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create an empty pending file if there is none yet
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, "")?;
        Ok(())
    }

    /// Non-blank, trimmed lines. A missing file means nothing to do.
    pub fn load_pending(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Overwrite the pending file with the residual failures
    pub fn persist_failed(&self, failed: &[String]) -> Result<()> {
        self.replace_with(failed)
    }

    pub fn replace_with(&self, urls: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, urls.join("\n"))?;
        Ok(())
    }

    /// Every entry's source URL, for requeueing or export
    pub fn rebuild_from_collection(collection: &CollectionStore) -> Vec<String> {
        collection.urls()
    }
}
