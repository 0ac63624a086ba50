//! Transport-neutral HTTP request and response values.

use crate::types::HttpMethod;
use std::collections::BTreeMap;

/// Status code telling the client its current copy is still valid.
pub const STATUS_NOT_MODIFIED: u16 = 304;

/// Outbound request handed to an [`HttpTransport`](crate::ports::HttpTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

/// Response received from an [`HttpTransport`](crate::ports::HttpTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Anything below 100 or from 400 up is a failure.
    pub fn is_failure(&self) -> bool {
        self.status < 100 || self.status >= 400
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == STATUS_NOT_MODIFIED
    }
}
