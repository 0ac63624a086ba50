//! Port traits (hexagonal architecture).
//!
//! The engine reaches persistent storage, the network and the wall clock only
//! through these traits; adapters are injected at construction time.

use crate::error::{StoreError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// String key-value storage holding trees and metadata.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Absence is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Delete a value. Deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One HTTP round trip.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request. Any received response is `Ok`, whatever its status.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
