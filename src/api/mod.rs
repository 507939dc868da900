//! Fingerbank API client
//!
//! Builds one GET request per endpoint and routes it through the response
//! cache before and after the network call.

pub mod client;
pub mod models;
pub mod params;

pub use client::{
    ApiError, ClientConfig, Fetched, FingerbankClient, ResponseSource, DEFAULT_BASE_URL,
    DEFAULT_USER_AGENT,
};
pub use models::{Device, Interrogation};
pub use params::InterrogateParams;
