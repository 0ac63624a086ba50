//! Public entry point of the engine.

use crate::config::SyncConfig;
use crate::executor::{StepContext, StepExecutor};
use crate::metrics::SyncMetrics;
use crate::request::{LoadRequest, TreeChange};
use std::sync::Arc;
use tether_cache::{CacheStore, MetadataStore};
use tether_core::{Clock, HttpTransport, KeyValueStore, LoadErrors, SystemClock, Tree};
use tether_fetch::{HeaderPolicy, RemoteFetcher};
use tracing::{debug, info, warn};

/// Loads resources through a strategy and reports every transition to the
/// consumer.
///
/// Calls are independent: two loads of the same resource each run their own
/// reads, writes and requests.
pub struct SyncCoordinator {
    config: SyncConfig,
    cache: CacheStore,
    metadata: MetadataStore,
    executor: StepExecutor,
    metrics: Arc<SyncMetrics>,
}

impl SyncCoordinator {
    /// Create a coordinator on the wall clock.
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::with_clock(config, store, transport, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: SyncConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = CacheStore::new(store.clone(), config.tree_namespace.clone());
        let metadata = MetadataStore::new(store, config.metadata_namespace.clone());
        let headers = HeaderPolicy::new(config.headers.clone(), metadata.clone());
        let fetcher = RemoteFetcher::new(
            transport,
            headers,
            cache.clone(),
            metadata.clone(),
            clock.clone(),
        );
        let metrics = Arc::new(SyncMetrics::new());
        let executor = StepExecutor::new(
            cache.clone(),
            metadata.clone(),
            fetcher,
            clock,
            metrics.clone(),
        );

        Self {
            config,
            cache,
            metadata,
            executor,
            metrics,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Load a resource.
    ///
    /// Emits, in order: an optional loading placeholder, every tree the
    /// primary phase produces, then either the caller's fallback tree, the
    /// fallback phase's tree, or an error placeholder. Returns the collected
    /// errors, primary phase first, when nothing could be shown.
    pub async fn load<F>(&self, request: LoadRequest, mut on_change: F) -> Result<(), LoadErrors>
    where
        F: FnMut(TreeChange),
    {
        let LoadRequest {
            key,
            strategy,
            headers,
            fallback_tree,
            loading_element,
            error_element,
            show_loading,
            show_error,
            save_cache,
            retry,
        } = request;

        let strategy = strategy.unwrap_or(self.config.default_strategy);
        let plan = strategy.plan();
        self.metrics.record_load();
        info!(%key, %strategy, "Loading tree");

        if show_loading && !plan.primary.is_empty() {
            let element = loading_element.as_deref().unwrap_or(&self.config.loading_element);
            on_change(TreeChange::Loading(Tree::placeholder(element)));
        }

        let ctx = StepContext {
            key: &key,
            headers: &headers,
            save_cache,
        };
        let mut emit = |tree: Tree| on_change(TreeChange::Loaded(tree));

        let primary = self
            .executor
            .run_phase(plan.primary, false, &ctx, &mut emit)
            .await;
        if primary.succeeded {
            debug!(%key, emitted = primary.emitted, "Primary phase succeeded");
            return Ok(());
        }

        if let Some(tree) = fallback_tree {
            debug!(%key, "Primary phase failed, showing fallback tree");
            self.metrics.record_fallback_tree();
            on_change(TreeChange::Fallback(tree));
            return Ok(());
        }

        let mut emit = |tree: Tree| on_change(TreeChange::Loaded(tree));
        let fallback = self
            .executor
            .run_phase(plan.fallback, true, &ctx, &mut emit)
            .await;
        if fallback.succeeded {
            debug!(%key, "Fallback phase succeeded");
            return Ok(());
        }

        let mut errors = primary.errors;
        errors.extend(fallback.errors);
        self.metrics.record_load_failed();
        warn!(%key, %strategy, errors = %errors, "Load failed");

        if show_error {
            let element = error_element.as_deref().unwrap_or(&self.config.error_element);
            on_change(TreeChange::Failed {
                tree: error_tree(element, &errors),
                errors: errors.clone(),
                retry,
            });
        }

        Err(errors)
    }
}

fn error_tree(element: &str, errors: &LoadErrors) -> Tree {
    let mut value = Tree::placeholder(element).into_value();
    value["errors"] = errors.iter().map(|e| e.to_string()).collect();
    Tree::new(value)
}
