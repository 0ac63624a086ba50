//! Freshness metadata per resource.

use crate::keys::storage_key;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tether_core::{FreshnessMetadata, KeyValueStore, LoadError, ResourceKey};
use tracing::{debug, warn};

/// Persists the change token, fetch time and TTL of each resource, separately
/// from the tree itself.
#[derive(Clone)]
pub struct MetadataStore {
    backend: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl MetadataStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Read metadata for `key`. An unreadable entry counts as absent.
    pub async fn get(&self, key: &ResourceKey) -> Result<Option<FreshnessMetadata>, LoadError> {
        let stored = self
            .backend
            .get(&storage_key(&self.namespace, key))
            .await
            .map_err(|e| LoadError::storage(key, e))?;

        Ok(stored.and_then(|text| match serde_json::from_str(&text) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(%key, error = %e, "Ignoring malformed freshness metadata");
                None
            }
        }))
    }

    pub async fn set(
        &self,
        key: &ResourceKey,
        metadata: &FreshnessMetadata,
    ) -> Result<(), LoadError> {
        let text = serde_json::to_string(metadata).map_err(|e| LoadError::storage(key, e.into()))?;
        self.backend
            .set(&storage_key(&self.namespace, key), text)
            .await
            .map_err(|e| LoadError::storage(key, e))?;
        debug!(%key, ttl_seconds = ?metadata.ttl_seconds, "Freshness metadata stored");
        Ok(())
    }

    pub async fn remove(&self, key: &ResourceKey) -> Result<(), LoadError> {
        self.backend
            .remove(&storage_key(&self.namespace, key))
            .await
            .map_err(|e| LoadError::storage(key, e))
    }

    /// Whether `metadata` still validates at `now`.
    ///
    /// True only when metadata exists, carries a TTL, and fewer than
    /// `ttl_seconds` seconds have passed since it was fetched.
    pub fn is_fresh(metadata: Option<&FreshnessMetadata>, now: DateTime<Utc>) -> bool {
        let Some(metadata) = metadata else {
            return false;
        };
        let Some(ttl_seconds) = metadata.ttl_seconds else {
            return false;
        };
        let elapsed_ms = (now - metadata.fetched_at).num_milliseconds();
        elapsed_ms < i64::try_from(ttl_seconds).unwrap_or(i64::MAX).saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryStore;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[test]
    fn test_ttl_boundary() {
        let metadata = FreshnessMetadata::new("h1", t0(), Some(5));
        assert!(MetadataStore::is_fresh(Some(&metadata), t0()));
        assert!(MetadataStore::is_fresh(
            Some(&metadata),
            t0() + Duration::milliseconds(4_999)
        ));
        assert!(!MetadataStore::is_fresh(
            Some(&metadata),
            t0() + Duration::milliseconds(5_000)
        ));
    }

    #[test]
    fn test_missing_ttl_or_metadata_is_never_fresh() {
        let metadata = FreshnessMetadata::new("h1", t0(), None);
        assert!(!MetadataStore::is_fresh(Some(&metadata), t0()));
        assert!(!MetadataStore::is_fresh(None, t0()));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let metadata = FreshnessMetadata::new("h1", t0(), Some(0));
        assert!(!MetadataStore::is_fresh(Some(&metadata), t0()));
    }

    #[tokio::test]
    async fn test_round_trip_through_backend() {
        let backend = Arc::new(MemoryStore::new());
        let store = MetadataStore::new(backend.clone(), "meta");
        let key = ResourceKey::get("/home");

        assert_eq!(store.get(&key).await.unwrap(), None);
        let metadata = FreshnessMetadata::new("h1", t0(), Some(5));
        store.set(&key, &metadata).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(metadata));

        backend.set("meta//home/GET", "garbage".to_string()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
    }
}
