//! Shared fixtures for coordinator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tether_cache::MemoryStore;
use tether_core::{
    HttpRequest, HttpResponse, HttpTransport, ManualClock, ResourceKey, TransportError, Tree,
};
use tether_sync::{SyncConfig, SyncCoordinator};

/// Transport answering from a queue of scripted results.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn push(&self, result: Result<HttpResponse, TransportError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn respond(&self, response: HttpResponse) {
        self.push(Ok(response));
    }

    pub fn fail(&self) {
        self.push(Err(TransportError::Connect("connection refused".to_string())));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}

pub struct Harness {
    pub coordinator: SyncCoordinator,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

pub fn harness() -> Harness {
    harness_with(SyncConfig::default())
}

pub fn harness_with(config: SyncConfig) -> Harness {
    let transport = Arc::new(ScriptedTransport::default());
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let coordinator =
        SyncCoordinator::with_clock(config, store.clone(), transport.clone(), clock.clone());
    Harness {
        coordinator,
        transport,
        store,
        clock,
    }
}

pub fn key() -> ResourceKey {
    ResourceKey::get("https://example.com/screens/home")
}

pub fn tree(name: &str) -> Tree {
    Tree::new(serde_json::json!({ "_component_": "screen", "id": name }))
}

pub fn ok_response(tree: &Tree) -> HttpResponse {
    HttpResponse::new(200).with_body(tree.to_json())
}
