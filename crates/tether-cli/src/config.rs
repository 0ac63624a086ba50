//! CLI configuration management.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tether_sync::{Strategy, SyncConfig};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Directory holding stored trees and metadata.
    pub store_dir: Option<PathBuf>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Engine configuration.
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            timeout_secs: default_timeout_secs(),
            sync: SyncConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from file.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.yaml"))
    }

    /// Store directory, falling back to the platform cache dir.
    pub fn store_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.store_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.cache_dir().join("store")),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "store_dir" => self.store_dir = Some(PathBuf::from(value)),
            "timeout_secs" => {
                self.timeout_secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| format!("Invalid timeout: {}", value))?;
            }
            "platform" => self.sync.headers.platform = value.to_string(),
            "disable_conditional_headers" => {
                self.sync.headers.disable_conditional_headers = value
                    .parse()
                    .map_err(|_| format!("Invalid boolean: {}", value))?;
            }
            "default_strategy" => {
                self.sync.default_strategy =
                    value.parse::<Strategy>().map_err(|e| e.to_string())?;
            }
            "loading_element" => self.sync.loading_element = value.to_string(),
            "error_element" => self.sync.error_element = value.to_string(),
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}

fn project_dirs() -> anyhow::Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "tether", "tether")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}
