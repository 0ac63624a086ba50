//! Resource keys, trees and freshness metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// HTTP method of a resource request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            _ => Err(format!("Unknown HTTP method: {}", s)),
        }
    }
}

/// Identifies a remote tree and its stored copies: one tree entry and one
/// metadata entry per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
}

impl ResourceKey {
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
        }
    }

    /// Key for a plain GET of `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Get)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Attribute naming the component of a synthetic placeholder tree.
pub const COMPONENT_ATTRIBUTE: &str = "_component_";

/// A server-described UI tree. The engine never looks inside it; it is stored
/// and handed to the consumer verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree(serde_json::Value);

impl Tree {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Decode a response body or stored value.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes).map(Self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self)
    }

    pub fn to_json(&self) -> String {
        self.0.to_string()
    }

    /// Synthetic single-node tree rendering the named element.
    pub fn placeholder(element: &str) -> Self {
        Self(serde_json::json!({ COMPONENT_ATTRIBUTE: element }))
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Component name of a placeholder tree.
    pub fn component(&self) -> Option<&str> {
        self.0.get(COMPONENT_ATTRIBUTE).and_then(|v| v.as_str())
    }
}

impl From<serde_json::Value> for Tree {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Freshness metadata recorded for a resource after a conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessMetadata {
    /// Opaque server token identifying the current version of the tree.
    pub change_token: String,
    /// When the response carrying this metadata arrived.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
    /// Time to live announced by the server. `None` never validates as fresh.
    #[serde(
        default,
        serialize_with = "serialize_ttl",
        deserialize_with = "deserialize_ttl"
    )]
    pub ttl_seconds: Option<u64>,
}

impl FreshnessMetadata {
    pub fn new(
        change_token: impl Into<String>,
        fetched_at: DateTime<Utc>,
        ttl_seconds: Option<u64>,
    ) -> Self {
        Self {
            change_token: change_token.into(),
            fetched_at,
            ttl_seconds,
        }
    }
}

// Missing TTLs are stored as an empty string.
fn serialize_ttl<S: Serializer>(ttl: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
    match ttl {
        Some(seconds) => serializer.serialize_u64(*seconds),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_ttl<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTtl {
        Number(u64),
        Text(String),
        Null(()),
    }

    Ok(match RawTtl::deserialize(deserializer)? {
        RawTtl::Number(n) => Some(n),
        RawTtl::Text(text) => text.trim().parse().ok(),
        RawTtl::Null(()) => None,
    })
}
