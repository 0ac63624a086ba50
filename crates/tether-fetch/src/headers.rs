//! Outbound request headers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tether_cache::MetadataStore;
use tether_core::{LoadError, ResourceKey};

/// Names and values of the headers the engine adds to every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Client identifier sent with every request.
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_platform_header")]
    pub platform_header: String,
    /// Header carrying the change token, both outbound and inbound.
    #[serde(default = "default_change_token_header")]
    pub change_token_header: String,
    /// Send no engine headers at all.
    #[serde(default)]
    pub disable_conditional_headers: bool,
}

fn default_platform() -> String {
    "WEB".to_string()
}

fn default_platform_header() -> String {
    "platform-tag".to_string()
}

fn default_change_token_header() -> String {
    "change-token".to_string()
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            platform_header: default_platform_header(),
            change_token_header: default_change_token_header(),
            disable_conditional_headers: false,
        }
    }
}

/// Derives engine headers from configuration and stored metadata.
#[derive(Clone)]
pub struct HeaderPolicy {
    config: HeaderConfig,
    metadata: MetadataStore,
}

impl HeaderPolicy {
    pub fn new(config: HeaderConfig, metadata: MetadataStore) -> Self {
        Self { config, metadata }
    }

    pub fn config(&self) -> &HeaderConfig {
        &self.config
    }

    /// Engine headers for `key`: the platform tag, plus the last known change
    /// token when `conditional` is set and one is stored.
    pub async fn headers_for(
        &self,
        key: &ResourceKey,
        conditional: bool,
    ) -> Result<BTreeMap<String, String>, LoadError> {
        let mut headers = BTreeMap::new();
        if self.config.disable_conditional_headers {
            return Ok(headers);
        }

        headers.insert(
            self.config.platform_header.clone(),
            self.config.platform.clone(),
        );
        if conditional && let Some(metadata) = self.metadata.get(key).await? {
            headers.insert(
                self.config.change_token_header.clone(),
                metadata.change_token,
            );
        }
        Ok(headers)
    }

    /// Merge engine headers over caller headers; on a name clash the engine wins.
    pub async fn merged(
        &self,
        key: &ResourceKey,
        caller: &BTreeMap<String, String>,
        conditional: bool,
    ) -> Result<BTreeMap<String, String>, LoadError> {
        let engine = self.headers_for(key, conditional).await?;
        let mut merged: BTreeMap<String, String> = caller
            .iter()
            .filter(|(name, _)| {
                !engine
                    .keys()
                    .any(|engine_name| engine_name.eq_ignore_ascii_case(name))
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        merged.extend(engine);
        Ok(merged)
    }
}
