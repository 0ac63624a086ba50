//! Counters for load observability.

use std::sync::atomic::{AtomicU64, Ordering};

/// Engine counters. Cheap to update from any task.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// Load calls started.
    pub loads: AtomicU64,
    /// Load calls that ended in an error list.
    pub loads_failed: AtomicU64,
    /// Load calls answered by the caller's fallback tree.
    pub fallback_trees: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    /// Fresh-cache reads rejected by TTL validation.
    pub cache_expired: AtomicU64,
    /// Outbound requests that produced a tree.
    pub network_successes: AtomicU64,
    pub network_failures: AtomicU64,
    /// Conditional fetches answered with not-modified.
    pub not_modified: AtomicU64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failed(&self) {
        self.loads_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_tree(&self) {
        self.fallback_trees.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_expired(&self) {
        self.cache_expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_success(&self) {
        self.network_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_modified(&self) {
        self.not_modified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            loads: self.loads.load(Ordering::Relaxed),
            loads_failed: self.loads_failed.load(Ordering::Relaxed),
            fallback_trees: self.fallback_trees.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_expired: self.cache_expired.load(Ordering::Relaxed),
            network_successes: self.network_successes.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            not_modified: self.not_modified.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SyncMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub loads: u64,
    pub loads_failed: u64,
    pub fallback_trees: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_expired: u64,
    pub network_successes: u64,
    pub network_failures: u64,
    pub not_modified: u64,
}
