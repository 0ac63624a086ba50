//! Last-known tree per resource.

use crate::keys::storage_key;
use std::sync::Arc;
use tether_core::{KeyValueStore, LoadError, ResourceKey, StoreError, Tree};
use tracing::debug;

/// Persists the last tree associated with each resource. Knows nothing about
/// freshness; entries are never evicted.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Read the stored tree, failing with `CacheMiss` when there is none.
    pub async fn get(&self, key: &ResourceKey) -> Result<Tree, LoadError> {
        let stored = self
            .backend
            .get(&storage_key(&self.namespace, key))
            .await
            .map_err(|e| LoadError::storage(key, e))?;

        let Some(text) = stored else {
            debug!(%key, "Tree cache miss");
            return Err(LoadError::cache_miss(key));
        };

        let tree = Tree::from_json(&text)
            .map_err(|e| LoadError::storage(key, StoreError::from(e)))?;
        debug!(%key, "Tree cache hit");
        Ok(tree)
    }

    /// Store `tree` as the last known tree for `key`.
    pub async fn set(&self, key: &ResourceKey, tree: &Tree) -> Result<(), LoadError> {
        self.backend
            .set(&storage_key(&self.namespace, key), tree.to_json())
            .await
            .map_err(|e| LoadError::storage(key, e))?;
        debug!(%key, "Tree cached");
        Ok(())
    }

    pub async fn remove(&self, key: &ResourceKey) -> Result<(), LoadError> {
        self.backend
            .remove(&storage_key(&self.namespace, key))
            .await
            .map_err(|e| LoadError::storage(key, e))
    }
}
