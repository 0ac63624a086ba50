//! Key-value storage backends.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tether_core::{KeyValueStore, StoreError};
use tokio::sync::RwLock;
use tracing::debug;

use crate::keys::file_name_for;

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Filesystem-backed store: one file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root_dir: PathBuf,
}

impl FilesystemStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &std::path::Path {
        &self.root_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root_dir.join(file_name_for(key))
    }

    /// Unique sibling of `key_path` used while a write is in flight.
    fn tmp_path(&self, key: &str) -> PathBuf {
        let seq = TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.root_dir.join(format!(
            ".{}.{}.{}.tmp",
            file_name_for(key),
            std::process::id(),
            seq
        ))
    }
}

#[async_trait]
impl KeyValueStore for FilesystemStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.key_path(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root_dir).await?;
        let path = self.key_path(key);
        let tmp_path = self.tmp_path(key);
        debug!(path = %path.display(), bytes = value.len(), "Writing store entry");

        // Readers only ever see a complete file.
        if let Err(e) = tokio::fs::write(&tmp_path, value).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.key_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
