//! Tether Core
//!
//! Shared vocabulary for the tether engine: resource keys, trees, freshness
//! metadata, the load error taxonomy and the ports through which the engine
//! reaches storage, the network and the clock. Adapters live in the other
//! crates; this one has no I/O of its own.

pub mod error;
pub mod http;
pub mod ports;
pub mod types;

pub use error::{ErrorKind, LoadError, LoadErrors, StoreError, TransportError};
pub use http::{HttpRequest, HttpResponse};
pub use ports::{Clock, HttpTransport, KeyValueStore, ManualClock, SystemClock};
pub use types::{FreshnessMetadata, HttpMethod, ResourceKey, Tree};
