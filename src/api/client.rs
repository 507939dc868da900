//! Fingerbank v2 API client
//!
//! Each endpoint method builds a GET request, consults the cache, and only
//! performs the network call on a miss.

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Interrogation, InterrogateParams};
use crate::cache::{CacheConfig, CacheController, CacheError};
use crate::http::{Request, Response, AUTH_QUERY_PARAM};

/// Base URL for the Fingerbank v2 API
pub const DEFAULT_BASE_URL: &str = "https://api.fingerbank.org/api/v2";

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("fingerbank-rs/", env!("CARGO_PKG_VERSION"));

const ENDPOINT_INTERROGATE: &str = "/combinations/interrogate";
const ENDPOINT_DEVICES: &str = "/devices";
const ENDPOINT_DEVICES_BASE_INFO: &str = "/devices/base_info";
const ENDPOINT_USERS: &str = "/users";

/// Errors that can occur when calling the API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Cache lookup failed; the request was not sent
    #[error("Cache lookup failed: {0}")]
    Cache(#[from] CacheError),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered with a non-success status
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// An interrogation needs at least one parameter
    #[error("Interrogation requires a DHCP fingerprint, MAC address or user agent")]
    EmptyQuery,
}

/// Settings for a [`FingerbankClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Value of the User-Agent header
    pub user_agent: String,
    /// Response cache settings
    pub cache: CacheConfig,
}

impl ClientConfig {
    /// Creates a config for the public API with caching disabled
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache: CacheConfig::disabled(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the cache without a network call
    Cache,
    /// Received from the API
    Network,
}

/// A response together with its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub response: Response,
    pub source: ResponseSource,
}

impl Fetched {
    pub fn cached(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Cache,
        }
    }

    pub fn live(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
        }
    }

    pub fn is_from_cache(&self) -> bool {
        self.source == ResponseSource::Cache
    }
}

/// Client for the Fingerbank device-fingerprinting API
#[derive(Debug, Clone)]
pub struct FingerbankClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    user_agent: String,
    cache: CacheController,
}

impl FingerbankClient {
    /// Creates a new client from its configuration
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Creates a new client with a custom HTTP client
    pub fn with_client(config: ClientConfig, http_client: Client) -> Self {
        debug!(
            base_url = %config.base_url,
            cache = ?config.cache,
            "configured client"
        );

        Self {
            http_client,
            api_key: config.api_key,
            base_url: config.base_url,
            user_agent: config.user_agent,
            cache: CacheController::new(config.cache),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &CacheController {
        &self.cache
    }

    /// Identifies a device from its network fingerprints
    ///
    /// # Returns
    /// * `Ok(Response)` - The raw API response, possibly served from cache
    /// * `Err(ApiError::EmptyQuery)` - If no parameter is set
    /// * `Err(ApiError)` - If the cache lookup or the request fails
    pub async fn interrogate(&self, params: &InterrogateParams) -> Result<Response, ApiError> {
        self.execute(&self.interrogate_request(params)?).await
    }

    /// Interrogates and parses the result
    pub async fn interrogate_device(
        &self,
        params: &InterrogateParams,
    ) -> Result<Interrogation, ApiError> {
        let response = self.interrogate(params).await?;
        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status_code,
                body: response.body,
            });
        }
        Ok(response.json()?)
    }

    /// Fetches a single device by id
    pub async fn device(&self, id: u64) -> Result<Response, ApiError> {
        self.execute(&self.device_request(id)).await
    }

    /// Fetches the dump of all devices
    ///
    /// An empty `fields` selection uses the server default.
    pub async fn devices_base_info(&self, fields: &[&str]) -> Result<Response, ApiError> {
        self.execute(&self.devices_base_info_request(fields)).await
    }

    /// Fetches information about the account owning the API key
    ///
    /// Never cached: the result depends on the API key, which cache keys
    /// leave out.
    pub async fn account_info(&self) -> Result<Response, ApiError> {
        let request = self.request(ENDPOINT_USERS);
        debug!("account info bypasses the cache");
        self.send(&request).await
    }

    /// Builds the interrogation request
    ///
    /// Fails with `ApiError::EmptyQuery` if no parameter is set.
    pub fn interrogate_request(&self, params: &InterrogateParams) -> Result<Request, ApiError> {
        let pairs = params.query_pairs();
        if pairs.is_empty() {
            return Err(ApiError::EmptyQuery);
        }

        let mut request = self.request(ENDPOINT_INTERROGATE);
        for (name, value) in pairs {
            request = request.with_query(name, value);
        }
        Ok(request)
    }

    /// Builds the request for a single device
    pub fn device_request(&self, id: u64) -> Request {
        self.request(&format!("{}/{}", ENDPOINT_DEVICES, id))
    }

    /// Builds the base info request
    ///
    /// `fields` is sorted and deduplicated so the same selection always hits
    /// the same cache entry.
    pub fn devices_base_info_request(&self, fields: &[&str]) -> Request {
        let mut request = self.request(ENDPOINT_DEVICES_BASE_INFO);

        let mut fields: Vec<&str> = fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect();
        fields.sort_unstable();
        fields.dedup();
        if !fields.is_empty() {
            request = request.with_query("fields", fields.join(","));
        }

        request
    }

    /// Runs a request through the cache
    ///
    /// A failed cache lookup aborts the call. A failed cache update is logged
    /// and the live response is returned anyway.
    pub async fn execute(&self, request: &Request) -> Result<Response, ApiError> {
        self.fetch(request).await.map(|fetched| fetched.response)
    }

    /// Like [`execute`](Self::execute), but also reports whether the
    /// response was served from the cache
    ///
    /// The source is decided by the lookup itself, so a marker header sent
    /// by the API cannot pass a live response off as cached.
    pub async fn fetch(&self, request: &Request) -> Result<Fetched, ApiError> {
        if let Some(cached) = self.cache.check_cache(request)? {
            return Ok(Fetched::cached(cached));
        }

        debug!(url = %request.base_url, "executing request");
        let result = self.send(request).await;

        if let Err(e) = self.cache.update_cache(request, result.as_ref().ok()) {
            warn!(error = %e, "failed to update cache");
        }

        result.map(Fetched::live)
    }

    /// Builds a GET request for an endpoint, API key included
    fn request(&self, path: &str) -> Request {
        Request::get(format!("{}{}", self.base_url, path))
            .with_header("Content-Type", "application/json")
            .with_header("User-Agent", self.user_agent.as_str())
            .with_query(AUTH_QUERY_PARAM, self.api_key.as_str())
    }

    /// Sends a request over the network
    async fn send(&self, request: &Request) -> Result<Response, ApiError> {
        let url = request.url()?;

        let mut builder = self.http_client.request(request.method.into(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        Ok(Response::from_reqwest(response).await?)
    }
}
