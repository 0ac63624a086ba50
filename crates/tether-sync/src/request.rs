//! Load requests and the changes reported back to the consumer.

use crate::strategy::Strategy;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tether_core::{LoadErrors, ResourceKey, Tree};

/// Caller-supplied action offered by the error placeholder. Invoking it is
/// expected to issue a fresh load; the engine never calls it itself.
pub type RetryFn = Arc<dyn Fn() + Send + Sync>;

/// A tree handed to the consumer.
#[derive(Clone)]
pub enum TreeChange {
    /// Loading placeholder shown before the first step runs.
    Loading(Tree),
    /// A tree produced by a step, intermediate or final.
    Loaded(Tree),
    /// The caller's fallback tree, shown after the primary phase failed.
    Fallback(Tree),
    /// Error placeholder carrying every collected error.
    Failed {
        tree: Tree,
        errors: LoadErrors,
        retry: Option<RetryFn>,
    },
}

impl TreeChange {
    pub fn tree(&self) -> &Tree {
        match self {
            TreeChange::Loading(tree)
            | TreeChange::Loaded(tree)
            | TreeChange::Fallback(tree)
            | TreeChange::Failed { tree, .. } => tree,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, TreeChange::Loaded(_))
    }
}

impl fmt::Debug for TreeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeChange::Loading(tree) => f.debug_tuple("Loading").field(tree).finish(),
            TreeChange::Loaded(tree) => f.debug_tuple("Loaded").field(tree).finish(),
            TreeChange::Fallback(tree) => f.debug_tuple("Fallback").field(tree).finish(),
            TreeChange::Failed {
                tree,
                errors,
                retry,
            } => f
                .debug_struct("Failed")
                .field("tree", tree)
                .field("errors", errors)
                .field("retry", &retry.is_some())
                .finish(),
        }
    }
}

/// Parameters of one [`SyncCoordinator::load`](crate::SyncCoordinator::load) call.
#[derive(Clone)]
pub struct LoadRequest {
    pub key: ResourceKey,
    /// Policy to load with; `None` uses the configured default.
    pub strategy: Option<Strategy>,
    /// Extra request headers. Engine headers win on a name clash.
    pub headers: BTreeMap<String, String>,
    /// Tree to show instead of running the fallback phase.
    pub fallback_tree: Option<Tree>,
    pub loading_element: Option<String>,
    pub error_element: Option<String>,
    pub show_loading: bool,
    pub show_error: bool,
    /// Whether network steps persist the tree they fetch.
    pub save_cache: bool,
    pub retry: Option<RetryFn>,
}

impl LoadRequest {
    pub fn new(key: ResourceKey) -> Self {
        Self {
            key,
            strategy: None,
            headers: BTreeMap::new(),
            fallback_tree: None,
            loading_element: None,
            error_element: None,
            show_loading: true,
            show_error: true,
            save_cache: true,
            retry: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_fallback_tree(mut self, tree: Tree) -> Self {
        self.fallback_tree = Some(tree);
        self
    }

    pub fn with_loading_element(mut self, element: impl Into<String>) -> Self {
        self.loading_element = Some(element.into());
        self
    }

    pub fn with_error_element(mut self, element: impl Into<String>) -> Self {
        self.error_element = Some(element.into());
        self
    }

    pub fn show_loading(mut self, show: bool) -> Self {
        self.show_loading = show;
        self
    }

    pub fn show_error(mut self, show: bool) -> Self {
        self.show_error = show;
        self
    }

    pub fn save_cache(mut self, save: bool) -> Self {
        self.save_cache = save;
        self
    }

    pub fn with_retry(mut self, retry: impl Fn() + Send + Sync + 'static) -> Self {
        self.retry = Some(Arc::new(retry));
        self
    }
}

impl fmt::Debug for LoadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadRequest")
            .field("key", &self.key)
            .field("strategy", &self.strategy)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("fallback_tree", &self.fallback_tree.is_some())
            .field("show_loading", &self.show_loading)
            .field("show_error", &self.show_error)
            .field("save_cache", &self.save_cache)
            .finish()
    }
}
