//! Errors raised by the cache layer

use thiserror::Error;

use crate::http::Method;

/// Errors that can occur while keying, reading or writing cache entries
#[derive(Debug, Error)]
pub enum CacheError {
    /// Only GET requests can be cached
    #[error("methods other than GET are not supported by the cache (got {0})")]
    UnsupportedMethod(Method),

    /// The canonical request URL could not be built
    #[error("failed to derive cache key: {0}")]
    KeyDerivation(#[from] url::ParseError),

    /// A response could not be serialized for storage
    #[error("failed to serialize response for the cache: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A stored entry could not be deserialized
    #[error("failed to deserialize cached response: {0}")]
    Deserialization(#[source] serde_json::Error),
}
