//! Engine configuration.

use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tether_fetch::HeaderConfig;

/// Configuration of a [`SyncCoordinator`](crate::SyncCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Outbound header names and values.
    #[serde(flatten)]
    pub headers: HeaderConfig,
    /// Storage namespace of trees.
    #[serde(default = "default_tree_namespace")]
    pub tree_namespace: String,
    /// Storage namespace of freshness metadata.
    #[serde(default = "default_metadata_namespace")]
    pub metadata_namespace: String,
    /// Strategy used when a request names none.
    #[serde(default = "default_strategy")]
    pub default_strategy: Strategy,
    /// Element rendered while loading.
    #[serde(default = "default_loading_element")]
    pub loading_element: String,
    /// Element rendered when every step failed.
    #[serde(default = "default_error_element")]
    pub error_element: String,
}

fn default_tree_namespace() -> String {
    "tether-tree".to_string()
}

fn default_metadata_namespace() -> String {
    "tether-metadata".to_string()
}

fn default_strategy() -> Strategy {
    Strategy::NetworkWithFallbackToCache
}

fn default_loading_element() -> String {
    "loading".to_string()
}

fn default_error_element() -> String {
    "error".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            headers: HeaderConfig::default(),
            tree_namespace: default_tree_namespace(),
            metadata_namespace: default_metadata_namespace(),
            default_strategy: default_strategy(),
            loading_element: default_loading_element(),
            error_element: default_error_element(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Set the client identifier sent with every request.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.headers.platform = platform.into();
        self
    }

    /// Stop sending the platform tag and change token.
    pub fn with_conditional_headers_disabled(mut self, disabled: bool) -> Self {
        self.headers.disable_conditional_headers = disabled;
        self
    }

    pub fn with_namespaces(
        mut self,
        tree_namespace: impl Into<String>,
        metadata_namespace: impl Into<String>,
    ) -> Self {
        self.tree_namespace = tree_namespace.into();
        self.metadata_namespace = metadata_namespace.into();
        self
    }

    pub fn with_default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn with_elements(
        mut self,
        loading_element: impl Into<String>,
        error_element: impl Into<String>,
    ) -> Self {
        self.loading_element = loading_element.into();
        self.error_element = error_element.into();
        self
    }
}
