//! Error types for the tether engine.

use crate::http::HttpResponse;
use crate::types::ResourceKey;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a [`KeyValueStore`](crate::ports::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stored value: {0}")]
    Serialization(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Failure reported by an [`HttpTransport`](crate::ports::HttpTransport) before any
/// response was received.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Discriminant of a [`LoadError`], handy for asserting on error sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CacheMiss,
    ExpiredCache,
    Network,
    Storage,
}

/// Failure of a single load step. Every variant names the resource it concerns.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Cache miss for {key}")]
    CacheMiss { key: ResourceKey },

    #[error("Cached tree for {key} is expired or was never validated")]
    ExpiredCache { key: ResourceKey },

    #[error("Network request for {key} failed: {reason}")]
    Network {
        key: ResourceKey,
        /// Raw response, absent when the transport never got one.
        response: Option<HttpResponse>,
        reason: String,
    },

    #[error("Storage failure for {key}: {source}")]
    Storage {
        key: ResourceKey,
        #[source]
        source: Arc<StoreError>,
    },
}

impl LoadError {
    pub fn cache_miss(key: &ResourceKey) -> Self {
        LoadError::CacheMiss { key: key.clone() }
    }

    pub fn expired(key: &ResourceKey) -> Self {
        LoadError::ExpiredCache { key: key.clone() }
    }

    pub fn network(
        key: &ResourceKey,
        response: Option<HttpResponse>,
        reason: impl Into<String>,
    ) -> Self {
        LoadError::Network {
            key: key.clone(),
            response,
            reason: reason.into(),
        }
    }

    pub fn storage(key: &ResourceKey, source: StoreError) -> Self {
        LoadError::Storage {
            key: key.clone(),
            source: Arc::new(source),
        }
    }

    /// The resource this error concerns.
    pub fn key(&self) -> &ResourceKey {
        match self {
            LoadError::CacheMiss { key }
            | LoadError::ExpiredCache { key }
            | LoadError::Network { key, .. }
            | LoadError::Storage { key, .. } => key,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::CacheMiss { .. } => ErrorKind::CacheMiss,
            LoadError::ExpiredCache { .. } => ErrorKind::ExpiredCache,
            LoadError::Network { .. } => ErrorKind::Network,
            LoadError::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// The HTTP response attached to a network failure, if one was received.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            LoadError::Network { response, .. } => response.as_ref(),
            _ => None,
        }
    }
}

/// Ordered list of step failures collected over a whole load call.
///
/// Primary-phase errors come first, followed by fallback-phase errors, each in
/// the order their steps ran.
#[derive(Debug, Clone, Default)]
pub struct LoadErrors(Vec<LoadError>);

impl LoadErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: LoadError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, other: LoadErrors) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoadError> {
        self.0.iter()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.0.iter().map(LoadError::kind).collect()
    }

    pub fn into_vec(self) -> Vec<LoadError> {
        self.0
    }
}

impl From<Vec<LoadError>> for LoadErrors {
    fn from(errors: Vec<LoadError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for LoadErrors {
    type Item = LoadError;
    type IntoIter = std::vec::IntoIter<LoadError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LoadErrors {
    type Item = &'a LoadError;
    type IntoIter = std::slice::Iter<'a, LoadError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for LoadErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} load error(s)", self.0.len())?;
        for (i, error) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpMethod;

    #[test]
    fn test_error_carries_key() {
        let key = ResourceKey::new("https://example.com/home", HttpMethod::Get);
        let error = LoadError::cache_miss(&key);
        assert_eq!(error.key(), &key);
        assert_eq!(error.kind(), ErrorKind::CacheMiss);
        assert!(error.response().is_none());
    }

    #[test]
    fn test_error_list_display_keeps_order() {
        let key = ResourceKey::get("/home");
        let errors = LoadErrors::from(vec![
            LoadError::network(&key, None, "offline"),
            LoadError::cache_miss(&key),
        ]);

        assert_eq!(errors.kinds(), vec![ErrorKind::Network, ErrorKind::CacheMiss]);
        assert_eq!(
            errors.to_string(),
            concat!(
                "2 load error(s): Network request for GET /home failed: offline; ",
                "Cache miss for GET /home"
            )
        );
    }
}
