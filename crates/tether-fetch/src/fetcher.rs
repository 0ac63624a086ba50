//! Single network round trip with the change-token freshness protocol.

use crate::headers::HeaderPolicy;
use std::collections::BTreeMap;
use std::sync::Arc;
use tether_cache::{CacheStore, MetadataStore};
use tether_core::{
    Clock, FreshnessMetadata, HttpRequest, HttpResponse, HttpTransport, LoadError, ResourceKey,
    Tree,
};
use tracing::{debug, warn};

/// Per-call switches of [`RemoteFetcher::fetch_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Send the change token and honour not-modified responses.
    pub conditional: bool,
    /// Persist the resulting tree.
    pub save_cache: bool,
}

impl FetchOptions {
    pub fn plain() -> Self {
        Self {
            conditional: false,
            save_cache: true,
        }
    }

    pub fn conditional() -> Self {
        Self {
            conditional: true,
            save_cache: true,
        }
    }

    pub fn with_save_cache(mut self, save_cache: bool) -> Self {
        self.save_cache = save_cache;
        self
    }
}

/// Tree produced by a fetch, and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTree {
    pub tree: Tree,
    /// The server confirmed the stored copy instead of sending a body.
    pub not_modified: bool,
}

/// Performs one HTTP call for a resource and reconciles the answer with the
/// stores.
#[derive(Clone)]
pub struct RemoteFetcher {
    transport: Arc<dyn HttpTransport>,
    headers: HeaderPolicy,
    cache: CacheStore,
    metadata: MetadataStore,
    clock: Arc<dyn Clock>,
}

impl RemoteFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        headers: HeaderPolicy,
        cache: CacheStore,
        metadata: MetadataStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            headers,
            cache,
            metadata,
            clock,
        }
    }

    /// Fetch `key` once.
    ///
    /// Side effects are one outbound call, at most one metadata write and at
    /// most one tree write.
    pub async fn fetch_once(
        &self,
        key: &ResourceKey,
        caller_headers: &BTreeMap<String, String>,
        options: FetchOptions,
    ) -> Result<Tree, LoadError> {
        self.fetch(key, caller_headers, options)
            .await
            .map(|fetched| fetched.tree)
    }

    /// Same as [`fetch_once`](Self::fetch_once), also reporting whether the
    /// answer was a not-modified confirmation.
    pub async fn fetch(
        &self,
        key: &ResourceKey,
        caller_headers: &BTreeMap<String, String>,
        options: FetchOptions,
    ) -> Result<FetchedTree, LoadError> {
        let headers = self
            .headers
            .merged(key, caller_headers, options.conditional)
            .await?;
        let request = HttpRequest {
            method: key.method,
            url: key.url.clone(),
            headers,
        };

        debug!(%key, conditional = options.conditional, "Sending request");
        let response = self.transport.send(request).await.map_err(|e| {
            warn!(%key, error = %e, "Transport failure");
            LoadError::network(key, None, e.to_string())
        })?;

        if response.is_failure() {
            warn!(%key, status = response.status, "Request failed");
            let reason = format!("unexpected HTTP status {}", response.status);
            return Err(LoadError::network(key, Some(response), reason));
        }

        if options.conditional {
            self.record_freshness(key, &response).await?;

            if response.is_not_modified() {
                debug!(%key, "Not modified, reusing cached tree");
                let tree = self.cache.get(key).await?;
                if options.save_cache {
                    self.cache.set(key, &tree).await?;
                }
                return Ok(FetchedTree {
                    tree,
                    not_modified: true,
                });
            }
        }

        let tree = match Tree::from_slice(&response.body) {
            Ok(tree) => tree,
            Err(e) => {
                let reason = format!("response body is not a valid tree: {}", e);
                return Err(LoadError::network(key, Some(response), reason));
            }
        };

        if options.save_cache {
            self.cache.set(key, &tree).await?;
        }
        debug!(%key, status = response.status, "Fetched tree");
        Ok(FetchedTree {
            tree,
            not_modified: false,
        })
    }

    async fn record_freshness(
        &self,
        key: &ResourceKey,
        response: &HttpResponse,
    ) -> Result<(), LoadError> {
        let token_header = &self.headers.config().change_token_header;
        let Some(token) = response.header(token_header) else {
            return Ok(());
        };

        let ttl_seconds = response.header("cache-control").and_then(parse_max_age);
        let metadata = FreshnessMetadata::new(token, self.clock.now(), ttl_seconds);
        self.metadata.set(key, &metadata).await
    }
}

/// Extract the `max-age` directive of a cache-control value.
pub fn parse_max_age(cache_control: &str) -> Option<u64> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        value.trim().trim_matches('"').parse().ok()
    })
}
