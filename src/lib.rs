//! Fingerbank API client with local response caching
//!
//! The [`api`] module talks to the Fingerbank device-fingerprinting API;
//! [`cache`] keeps successful GET responses in a pluggable store so repeated
//! lookups skip the network.

pub mod api;
pub mod cache;
pub mod cli;
pub mod http;

pub use api::{ApiError, ClientConfig, Fetched, FingerbankClient, InterrogateParams, ResponseSource};
pub use cache::{CacheConfig, CacheController, CacheError, CacheStore, DiskStore, MemoryStore};
pub use http::{Method, Request, Response};
