//! Response cache for API requests
//!
//! Responses to GET requests are keyed by their canonical URL (API key
//! excluded) and stored as JSON in a pluggable [`CacheStore`]. The
//! [`CacheController`] decides freshness from the stored `Date` header and
//! deletes entries once they exceed the configured window.

mod controller;
mod disk;
mod error;
mod key;
mod store;

pub use controller::{
    format_http_date, parse_http_date, CacheConfig, CacheController, DEFAULT_MARKER_HEADER,
    DEFAULT_MAX_AGE_SECS,
};
pub use disk::DiskStore;
pub use error::CacheError;
pub use key::derive_key;
pub use store::{CacheStore, MemoryStore};
