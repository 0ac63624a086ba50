//! Storage key derivation.

use sha2::{Digest, Sha256};
use tether_core::ResourceKey;

/// Storage key of a resource inside a namespace: `<namespace>/<url>/<method>`.
pub fn storage_key(namespace: &str, key: &ResourceKey) -> String {
    format!("{}/{}/{}", namespace, key.url, key.method)
}

/// Longest readable prefix kept in a file name.
const READABLE_PREFIX_LEN: usize = 64;

/// Encode a storage key into a bounded, filesystem-safe file name.
///
/// A sanitized prefix of the key keeps the name readable; the SHA-256 of the
/// full key keeps distinct keys apart. The result never exceeds
/// `READABLE_PREFIX_LEN + 65` bytes whatever the key length.
pub fn file_name_for(key: &str) -> String {
    let readable: String = key
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .take(READABLE_PREFIX_LEN)
        .collect();

    let hash = Sha256::digest(key.as_bytes());
    format!("{}-{}", readable, hex::encode(hash))
}
