use anyhow::{Result, Context};
use crate::models::FeedResponse;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

/// Key-value store backing the fallback snapshot.
/// Populated on every successful ingestion, read only when the upstream fails.
pub trait SnapshotStore: Send + Sync {
    fn write(&self, response: &FeedResponse) -> Result<()>;

    /// `Ok(None)` when nothing has been written yet.
    fn read(&self) -> Result<Option<FeedResponse>>;
}

/// Snapshot stored as one JSON file, replaced atomically on each write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates the parent directory if needed.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
    }
}

impl SnapshotStore for FileStore {
    fn write(&self, response: &FeedResponse) -> Result<()> {
        let json = serde_json::to_string_pretty(response)?;
        let temp = self.temp_path();

        fs::write(&temp, json)
            .with_context(|| format!("Failed to write snapshot: {}", temp.display()))?;
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(e)
                .with_context(|| format!("Failed to replace snapshot: {}", self.path.display()));
        }
        Ok(())
    }

    fn read(&self) -> Result<Option<FeedResponse>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        let response = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt snapshot: {}", self.path.display()))?;
        Ok(Some(response))
    }
}

/// In-process store, one snapshot per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    key: String,
    entries: RwLock<HashMap<String, FeedResponse>>,
}

impl MemoryStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn write(&self, response: &FeedResponse) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("Snapshot store lock poisoned"))?;
        entries.insert(self.key.clone(), response.clone());
        Ok(())
    }

    fn read(&self) -> Result<Option<FeedResponse>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("Snapshot store lock poisoned"))?;
        Ok(entries.get(&self.key).cloned())
    }
}

/// Reads the snapshot, treating an unreadable entry the same as a missing one.
pub fn read_fallback(store: &dyn SnapshotStore) -> Option<FeedResponse> {
    match store.read() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Ignoring unusable news snapshot: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
