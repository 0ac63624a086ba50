//! Tree and freshness metadata persistence for tether.
//!
//! Both stores sit on an injected [`KeyValueStore`](tether_core::KeyValueStore)
//! and keep their entries under disjoint namespaces.

pub mod keys;
pub mod metadata;
pub mod provider;
pub mod store;

pub use keys::{file_name_for, storage_key};
pub use metadata::MetadataStore;
pub use provider::{FilesystemStore, MemoryStore};
pub use store::CacheStore;
