//! Command handlers.

use crate::commands::LoadArgs;
use crate::config::CliConfig;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tether_cache::{CacheStore, FilesystemStore, MetadataStore};
use tether_core::{HttpMethod, ResourceKey, Tree};
use tether_fetch::ReqwestTransport;
use tether_sync::{LoadRequest, Strategy, SyncCoordinator, TreeChange};
use tracing::debug;

fn resource_key(url: &str, method: &str) -> anyhow::Result<ResourceKey> {
    url::Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    let method: HttpMethod = method.parse().map_err(anyhow::Error::msg)?;
    Ok(ResourceKey::new(url, method))
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Header must look like `name: value`, got `{}`", raw))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn store(config: &CliConfig) -> anyhow::Result<Arc<FilesystemStore>> {
    let dir = config.store_dir()?;
    debug!(dir = %dir.display(), "Using filesystem store");
    Ok(Arc::new(FilesystemStore::new(dir)))
}

fn change_to_json(change: &TreeChange) -> serde_json::Value {
    match change {
        TreeChange::Loading(tree) => serde_json::json!({"event": "loading", "tree": tree}),
        TreeChange::Loaded(tree) => serde_json::json!({"event": "loaded", "tree": tree}),
        TreeChange::Fallback(tree) => serde_json::json!({"event": "fallback", "tree": tree}),
        TreeChange::Failed { tree, errors, .. } => serde_json::json!({
            "event": "failed",
            "tree": tree,
            "errors": errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        }),
    }
}

pub async fn load(config: &CliConfig, args: LoadArgs) -> anyhow::Result<()> {
    let key = resource_key(&args.url, &args.method)?;
    let transport = ReqwestTransport::with_timeout(config.timeout())?;
    let coordinator =
        SyncCoordinator::new(config.sync.clone(), store(config)?, Arc::new(transport));

    let mut request = LoadRequest::new(key)
        .show_loading(!args.no_loading)
        .show_error(!args.no_error)
        .save_cache(!args.no_save);
    if let Some(name) = &args.strategy {
        request = request.with_strategy(name.parse::<Strategy>()?);
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }
    if let Some(path) = &args.fallback {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fallback tree {}", path.display()))?;
        request = request.with_fallback_tree(Tree::from_json(&text)?);
    }

    let result = coordinator
        .load(request, |change| println!("{}", change_to_json(&change)))
        .await;

    let snapshot = coordinator.metrics().snapshot();
    debug!(?snapshot, "Load finished");
    result.map_err(anyhow::Error::from)
}

pub async fn inspect(config: &CliConfig, url: &str, method: &str) -> anyhow::Result<()> {
    let key = resource_key(url, method)?;
    let backend = store(config)?;
    let cache = CacheStore::new(backend.clone(), config.sync.tree_namespace.clone());
    let metadata = MetadataStore::new(backend, config.sync.metadata_namespace.clone());

    let tree = match cache.get(&key).await {
        Ok(tree) => Some(tree),
        Err(tether_core::LoadError::CacheMiss { .. }) => None,
        Err(e) => return Err(e.into()),
    };
    let metadata = metadata.get(&key).await?;

    let output = serde_json::json!({
        "key": key,
        "tree": tree,
        "metadata": metadata,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub async fn clear(config: &CliConfig, url: &str, method: &str) -> anyhow::Result<()> {
    let key = resource_key(url, method)?;
    let backend = store(config)?;
    CacheStore::new(backend.clone(), config.sync.tree_namespace.clone())
        .remove(&key)
        .await?;
    MetadataStore::new(backend, config.sync.metadata_namespace.clone())
        .remove(&key)
        .await?;
    println!("Cleared {}", key);
    Ok(())
}

pub fn list_strategies() {
    for strategy in Strategy::ALL {
        let plan = strategy.plan();
        println!(
            "{:<34} primary: {:?}  fallback: {:?}",
            strategy.name(),
            plan.primary,
            plan.fallback
        );
    }
}

pub fn show_config(config: &CliConfig) -> anyhow::Result<()> {
    println!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

pub fn set_config(key: &str, value: &str) -> anyhow::Result<()> {
    set_config_at(&CliConfig::config_path()?, key, value)?;
    println!("Set {} = {}", key, value);
    Ok(())
}

/// Update one key in the config file at `path`, refusing to overwrite a file
/// that does not parse.
fn set_config_at(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = CliConfig::load_from(path)?;
    config.set(key, value).map_err(anyhow::Error::msg)?;
    config.save_to(path)
}
