//! Behaviour of every strategy through the public load API.

mod common;

use chrono::Duration;
use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tether_core::{ErrorKind, FreshnessMetadata, HttpResponse, Tree};
use tether_sync::{LoadRequest, Strategy, SyncConfig, TreeChange};

/// Short labels for asserting on emission order.
fn labels(changes: &[TreeChange]) -> Vec<String> {
    changes
        .iter()
        .map(|change| match change {
            TreeChange::Loading(_) => "loading".to_string(),
            TreeChange::Loaded(tree) => {
                format!("loaded:{}", tree.value()["id"].as_str().unwrap_or("?"))
            }
            TreeChange::Fallback(_) => "fallback".to_string(),
            TreeChange::Failed { .. } => "failed".to_string(),
        })
        .collect()
}

async fn seed_tree(h: &Harness, tree: &Tree) {
    h.coordinator.cache().set(&key(), tree).await.unwrap();
}

async fn seed_metadata(h: &Harness, ttl_seconds: Option<u64>) {
    h.coordinator
        .metadata()
        .set(&key(), &FreshnessMetadata::new("h1", t0(), ttl_seconds))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_validated_first_load_fetches_and_records_freshness() {
    let h = harness();
    let body = tree("net");
    h.transport.respond(
        ok_response(&body)
            .with_header("change-token", "h1")
            .with_header("cache-control", "max-age=5"),
    );

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::ValidatedCacheOnly),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:net"]);
    assert_eq!(
        h.coordinator.metadata().get(&key()).await.unwrap(),
        Some(FreshnessMetadata::new("h1", t0(), Some(5)))
    );
    assert_eq!(h.coordinator.cache().get(&key()).await.unwrap(), body);

    let metrics = h.coordinator.metrics().snapshot();
    assert_eq!(metrics.cache_hits + metrics.cache_misses, 0, "no plain cache read");
    assert_eq!(metrics.cache_expired, 1);
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test]
async fn test_validated_second_load_within_ttl_skips_network() {
    let h = harness();
    h.transport.respond(
        ok_response(&tree("net"))
            .with_header("change-token", "h1")
            .with_header("cache-control", "max-age=5"),
    );
    let request = LoadRequest::new(key()).with_strategy(Strategy::ValidatedCacheOnly);
    h.coordinator.load(request.clone(), |_| {}).await.unwrap();

    h.clock.advance(Duration::milliseconds(4_999));
    let mut changes = Vec::new();
    h.coordinator
        .load(request, |change| changes.push(change))
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:net"]);
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test]
async fn test_validated_after_ttl_revalidates_with_token() {
    let h = harness();
    seed_tree(&h, &tree("stored")).await;
    seed_metadata(&h, Some(5)).await;
    h.clock.advance(Duration::milliseconds(5_000));
    h.transport.respond(
        HttpResponse::new(304)
            .with_header("change-token", "h1")
            .with_header("cache-control", "max-age=10"),
    );

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::ValidatedCacheOnly),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:stored"]);
    let requests = h.transport.requests();
    assert_eq!(requests[0].headers.get("change-token").map(String::as_str), Some("h1"));
    assert_eq!(requests[0].headers.get("platform-tag").map(String::as_str), Some("WEB"));

    let metadata = h.coordinator.metadata().get(&key()).await.unwrap().unwrap();
    assert_eq!(metadata.ttl_seconds, Some(10));
    assert_eq!(metadata.fetched_at, t0() + Duration::milliseconds(5_000));

    let metrics = h.coordinator.metrics().snapshot();
    assert_eq!(metrics.not_modified, 1);
    assert_eq!(metrics.network_successes, 1);
}

#[tokio::test]
async fn test_fresh_metadata_without_stored_tree_falls_through_to_network() {
    let h = harness();
    seed_metadata(&h, Some(5)).await;
    h.clock.advance(Duration::milliseconds(1_000));
    h.transport.respond(
        ok_response(&tree("net"))
            .with_header("change-token", "h2")
            .with_header("cache-control", "max-age=5"),
    );

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::ValidatedCacheOnly),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:net"]);

    let metrics = h.coordinator.metrics().snapshot();
    assert_eq!(metrics.cache_misses, 1, "fresh read found no tree");
    assert_eq!(metrics.cache_expired, 0);
    assert_eq!(metrics.not_modified, 0);

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].headers.get("change-token").map(String::as_str), Some("h1"));
    assert_eq!(h.coordinator.cache().get(&key()).await.unwrap(), tree("net"));
}

#[tokio::test]
async fn test_fresh_metadata_without_stored_tree_reports_cache_miss_first() {
    let h = harness();
    seed_metadata(&h, Some(5)).await;
    h.transport.fail();

    let errors = h
        .coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::ValidatedCacheOnly),
            |_| {},
        )
        .await
        .unwrap_err();

    assert_eq!(errors.kinds(), vec![ErrorKind::CacheMiss, ErrorKind::Network]);
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test]
async fn test_validated_without_ttl_always_revalidates() {
    let h = harness();
    seed_tree(&h, &tree("stored")).await;
    seed_metadata(&h, None).await;
    h.transport.respond(HttpResponse::new(304));

    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::ValidatedCacheOnly),
            |_| {},
        )
        .await
        .unwrap();
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test]
async fn test_not_modified_without_stored_tree_fails() {
    let h = harness();
    seed_metadata(&h, Some(5)).await;
    h.clock.advance(Duration::seconds(60));
    h.transport.respond(HttpResponse::new(304).with_header("change-token", "h1"));

    let errors = h
        .coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::ValidatedCacheOnly),
            |_| {},
        )
        .await
        .unwrap_err();
    assert_eq!(errors.kinds(), vec![ErrorKind::ExpiredCache, ErrorKind::CacheMiss]);
}

#[tokio::test]
async fn test_cache_first_emits_cache_then_network() {
    let h = harness();
    seed_tree(&h, &tree("t1")).await;
    h.transport.respond(ok_response(&tree("t2")));

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::CacheFirst),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:t1", "loaded:t2"]);
    assert_eq!(h.coordinator.cache().get(&key()).await.unwrap(), tree("t2"));
}

#[tokio::test]
async fn test_cache_first_network_failure_after_cache_hit_is_success() {
    let h = harness();
    seed_tree(&h, &tree("t1")).await;
    h.transport.fail();

    let mut changes = Vec::new();
    let result = h
        .coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::CacheFirst),
            |change| changes.push(change),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(labels(&changes), vec!["loading", "loaded:t1"]);
}

#[tokio::test]
async fn test_network_with_fallback_aggregates_errors_in_order() {
    let h = harness();
    h.transport.fail();
    let retries = Arc::new(AtomicUsize::new(0));
    let counter = retries.clone();

    let mut changes = Vec::new();
    let errors = h
        .coordinator
        .load(
            LoadRequest::new(key())
                .with_strategy(Strategy::NetworkWithFallbackToCache)
                .with_retry(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            |change| changes.push(change),
        )
        .await
        .unwrap_err();

    assert_eq!(errors.kinds(), vec![ErrorKind::Network, ErrorKind::CacheMiss]);
    assert!(errors.iter().all(|e| e.key() == &key()));
    assert_eq!(labels(&changes), vec!["loading", "failed"]);

    let TreeChange::Failed {
        tree,
        errors: shown,
        retry,
    } = &changes[1]
    else {
        panic!("expected error placeholder");
    };
    assert_eq!(shown.kinds(), errors.kinds());
    assert_eq!(tree.component(), Some("error"));
    assert_eq!(tree.value()["errors"].as_array().map(Vec::len), Some(2));

    let retry = retry.as_ref().expect("retry threaded through");
    retry();
    assert_eq!(retries.load(Ordering::SeqCst), 1);
    assert_eq!(h.coordinator.metrics().snapshot().loads_failed, 1);
}

#[tokio::test]
async fn test_network_with_fallback_uses_cache() {
    let h = harness();
    seed_tree(&h, &tree("stored")).await;
    h.transport.respond(HttpResponse::new(500));

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::NetworkWithFallbackToCache),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:stored"]);
}

#[tokio::test]
async fn test_fallback_tree_short_circuits_fallback_phase() {
    let h = harness();
    seed_tree(&h, &tree("stored")).await;
    h.transport.fail();

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key())
                .with_strategy(Strategy::NetworkWithFallbackToCache)
                .with_fallback_tree(tree("fallback")),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "fallback"]);
    assert_eq!(changes[1].tree(), &tree("fallback"));

    let metrics = h.coordinator.metrics().snapshot();
    assert_eq!(metrics.cache_hits, 0, "fallback ReadCache never ran");
    assert_eq!(metrics.fallback_trees, 1);
}

#[tokio::test]
async fn test_cache_only_miss() {
    let h = harness();

    let errors = h
        .coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::CacheOnly),
            |_| {},
        )
        .await
        .unwrap_err();

    assert_eq!(errors.kinds(), vec![ErrorKind::CacheMiss]);
    assert_eq!(h.transport.calls(), 0);
}

#[tokio::test]
async fn test_network_only_without_cache_writes() {
    let h = harness();
    h.transport.respond(ok_response(&tree("net")));

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key())
                .with_strategy(Strategy::NetworkOnly)
                .save_cache(false),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:net"]);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_cache_with_fallback_to_network() {
    let h = harness();
    h.transport.respond(ok_response(&tree("net")));

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::CacheWithFallbackToNetwork),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:net"]);
    assert_eq!(h.coordinator.cache().get(&key()).await.unwrap(), tree("net"));

    // Second time the cache answers and the network is left alone.
    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::CacheWithFallbackToNetwork),
            |change| changes.push(change),
        )
        .await
        .unwrap();
    assert_eq!(labels(&changes), vec!["loading", "loaded:net"]);
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test]
async fn test_validated_with_fallback_to_cache() {
    let h = harness();
    seed_tree(&h, &tree("stale")).await;
    seed_metadata(&h, Some(5)).await;
    h.clock.advance(Duration::seconds(30));
    h.transport.fail();

    let mut changes = Vec::new();
    h.coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::ValidatedWithFallbackToCache),
            |change| changes.push(change),
        )
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:stale"]);
}

#[tokio::test]
async fn test_validated_with_fallback_total_failure() {
    let h = harness();
    h.transport.respond(HttpResponse::new(404));

    let errors = h
        .coordinator
        .load(
            LoadRequest::new(key()).with_strategy(Strategy::ValidatedWithFallbackToCache),
            |_| {},
        )
        .await
        .unwrap_err();

    assert_eq!(
        errors.kinds(),
        vec![ErrorKind::ExpiredCache, ErrorKind::Network, ErrorKind::CacheMiss]
    );
    assert_eq!(errors.iter().nth(1).and_then(|e| e.response()).map(|r| r.status), Some(404));
}

#[tokio::test]
async fn test_placeholders_can_be_disabled() {
    let h = harness();
    h.transport.fail();

    let mut changes = Vec::new();
    let errors = h
        .coordinator
        .load(
            LoadRequest::new(key())
                .with_strategy(Strategy::NetworkOnly)
                .show_loading(false)
                .show_error(false),
            |change| changes.push(change),
        )
        .await
        .unwrap_err();

    assert!(changes.is_empty());
    assert_eq!(errors.kinds(), vec![ErrorKind::Network]);
}

#[tokio::test]
async fn test_custom_placeholder_elements() {
    let h = harness_with(SyncConfig::default().with_elements("spinner", "oops"));
    h.transport.fail();

    let mut changes = Vec::new();
    let _ = h
        .coordinator
        .load(
            LoadRequest::new(key())
                .with_strategy(Strategy::NetworkOnly)
                .with_error_element("sad-face"),
            |change| changes.push(change),
        )
        .await;

    assert_eq!(changes[0].tree().component(), Some("spinner"));
    assert_eq!(changes[1].tree().component(), Some("sad-face"));
}

#[tokio::test]
async fn test_default_strategy_from_config() {
    let h = harness_with(SyncConfig::default().with_default_strategy(Strategy::CacheOnly));
    seed_tree(&h, &tree("stored")).await;

    let mut changes = Vec::new();
    h.coordinator
        .load(LoadRequest::new(key()), |change| changes.push(change))
        .await
        .unwrap();

    assert_eq!(labels(&changes), vec!["loading", "loaded:stored"]);
    assert_eq!(h.transport.calls(), 0);
}

#[tokio::test]
async fn test_disabled_engine_headers() {
    let h = harness_with(SyncConfig::default().with_conditional_headers_disabled(true));
    seed_metadata(&h, None).await;
    h.transport.respond(ok_response(&tree("net")));

    h.coordinator
        .load(
            LoadRequest::new(key())
                .with_strategy(Strategy::ValidatedCacheOnly)
                .with_header("accept-language", "en"),
            |_| {},
        )
        .await
        .unwrap();

    let headers = &h.transport.requests()[0].headers;
    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get("accept-language").map(String::as_str), Some("en"));
}

#[tokio::test]
async fn test_concurrent_loads_are_not_deduplicated() {
    let h = harness();
    h.transport.respond(ok_response(&tree("a")));
    h.transport.respond(ok_response(&tree("b")));

    let request = LoadRequest::new(key()).with_strategy(Strategy::NetworkOnly);
    let (first, second) = tokio::join!(
        h.coordinator.load(request.clone(), |_| {}),
        h.coordinator.load(request, |_| {}),
    );

    assert!(first.is_ok() && second.is_ok());
    assert_eq!(h.transport.calls(), 2);
    assert_eq!(h.coordinator.metrics().snapshot().loads, 2);
}
