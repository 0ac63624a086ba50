//! Network side of tether: outbound header derivation, the single round-trip
//! fetcher implementing the change-token protocol, and a reqwest transport.

pub mod fetcher;
pub mod headers;
pub mod transport;

pub use fetcher::{FetchOptions, FetchedTree, RemoteFetcher, parse_max_age};
pub use headers::{HeaderConfig, HeaderPolicy};
pub use transport::ReqwestTransport;
