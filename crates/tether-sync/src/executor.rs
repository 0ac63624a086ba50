//! Ordered execution of strategy steps.

use crate::metrics::SyncMetrics;
use crate::strategy::Step;
use std::collections::BTreeMap;
use std::sync::Arc;
use tether_cache::{CacheStore, MetadataStore};
use tether_core::{Clock, ErrorKind, LoadError, LoadErrors, ResourceKey, Tree};
use tether_fetch::{FetchOptions, RemoteFetcher};
use tracing::debug;

/// Per-load inputs shared by every step.
#[derive(Debug, Clone)]
pub struct StepContext<'a> {
    pub key: &'a ResourceKey,
    pub headers: &'a BTreeMap<String, String>,
    pub save_cache: bool,
}

/// Result of running one phase.
#[derive(Debug, Default)]
pub struct PhaseOutcome {
    pub succeeded: bool,
    /// Trees emitted during the phase.
    pub emitted: usize,
    pub errors: LoadErrors,
}

/// Runs steps against the stores and the network.
#[derive(Clone)]
pub struct StepExecutor {
    cache: CacheStore,
    metadata: MetadataStore,
    fetcher: RemoteFetcher,
    clock: Arc<dyn Clock>,
    metrics: Arc<SyncMetrics>,
}

impl StepExecutor {
    pub fn new(
        cache: CacheStore,
        metadata: MetadataStore,
        fetcher: RemoteFetcher,
        clock: Arc<dyn Clock>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            cache,
            metadata,
            fetcher,
            clock,
            metrics,
        }
    }

    /// Execute a single step.
    pub async fn run_step(&self, step: Step, ctx: &StepContext<'_>) -> Result<Tree, LoadError> {
        match step {
            Step::ReadCache => self.read_cache(ctx.key).await,
            Step::ReadCacheIfFresh => {
                let metadata = self.metadata.get(ctx.key).await?;
                if !MetadataStore::is_fresh(metadata.as_ref(), self.clock.now()) {
                    self.metrics.record_cache_expired();
                    return Err(LoadError::expired(ctx.key));
                }
                self.read_cache(ctx.key).await
            }
            Step::FetchNetwork => {
                let options = FetchOptions::plain().with_save_cache(ctx.save_cache);
                self.fetch(ctx, options).await
            }
            Step::FetchNetworkConditional => {
                let options = FetchOptions::conditional().with_save_cache(ctx.save_cache);
                self.fetch(ctx, options).await
            }
        }
    }

    /// Run `steps` in order, handing each produced tree to `emit` as soon as
    /// it exists.
    ///
    /// A failing step never aborts the phase. The phase stops after a success
    /// when `stop_on_first_success` is set or the successful step is
    /// authoritative; otherwise it keeps going.
    pub async fn run_phase<F>(
        &self,
        steps: &[Step],
        stop_on_first_success: bool,
        ctx: &StepContext<'_>,
        emit: &mut F,
    ) -> PhaseOutcome
    where
        F: FnMut(Tree),
    {
        let mut outcome = PhaseOutcome::default();

        for &step in steps {
            debug!(key = %ctx.key, ?step, "Running step");
            match self.run_step(step, ctx).await {
                Ok(tree) => {
                    emit(tree);
                    outcome.succeeded = true;
                    outcome.emitted += 1;
                    if stop_on_first_success || step.is_authoritative() {
                        break;
                    }
                }
                Err(error) => {
                    debug!(key = %ctx.key, ?step, error = %error, "Step failed");
                    outcome.errors.push(error);
                }
            }
        }

        outcome
    }

    async fn read_cache(&self, key: &ResourceKey) -> Result<Tree, LoadError> {
        let result = self.cache.get(key).await;
        match &result {
            Ok(_) => self.metrics.record_cache_hit(),
            Err(e) if e.kind() == ErrorKind::CacheMiss => self.metrics.record_cache_miss(),
            Err(_) => {}
        }
        result
    }

    async fn fetch(&self, ctx: &StepContext<'_>, options: FetchOptions) -> Result<Tree, LoadError> {
        match self.fetcher.fetch(ctx.key, ctx.headers, options).await {
            Ok(fetched) => {
                self.metrics.record_network_success();
                if fetched.not_modified {
                    self.metrics.record_not_modified();
                }
                Ok(fetched.tree)
            }
            Err(e) => {
                self.metrics.record_network_failure();
                Err(e)
            }
        }
    }
}
