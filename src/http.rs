//! Request and response data model
//!
//! These types describe an outbound API call and its result independently of
//! the HTTP stack, so the cache layer can key, store and replay them without
//! knowing anything about reqwest.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// Name of the query parameter carrying the API key
pub const AUTH_QUERY_PARAM: &str = "key";

/// Header holding the time a response was generated
pub const DATE_HEADER: &str = "Date";

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An outbound API request
///
/// Headers and query parameters are kept in `BTreeMap`s so that every
/// serialization of the same request is identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Endpoint URL without query string
    pub base_url: String,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Query parameters, including the API key
    pub query: BTreeMap<String, String>,
}

impl Request {
    /// Creates a GET request for the given endpoint URL
    pub fn get(base_url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            base_url: base_url.into(),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
        }
    }

    /// Adds or replaces a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds or replaces a query parameter
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Builds the full URL to send, API key included
    pub fn url(&self) -> Result<Url, url::ParseError> {
        build_url(
            &self.base_url,
            self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }
}

/// Joins a base URL and query parameters, in the order given
///
/// No `?` is appended when there are no parameters, so a bare endpoint and
/// its URL string stay identical.
pub fn build_url<'a>(
    base_url: &str,
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    let mut params = params.into_iter().peekable();
    if params.peek().is_some() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// A response as returned by the API, or replayed from the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status_code: u16,
    /// Header name to ordered values
    pub headers: BTreeMap<String, Vec<String>>,
    /// Response body
    pub body: String,
}

impl Response {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Appends a header value
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Returns all values of a header, matching the name case-insensitively
    pub fn header_values(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// Returns the first value of a header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Whether the header is present at all
    pub fn has_header(&self, name: &str) -> bool {
        self.header_values(name).is_some()
    }

    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Parses the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Converts a reqwest response, consuming its body
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> reqwest::Result<Self> {
        let status_code = response.status().as_u16();
        let headers = header_map(response.headers());
        let body = response.text().await?;

        Ok(Self {
            status_code,
            headers,
            body,
        })
    }
}

/// Collects reqwest headers into name-to-values form
///
/// Values outside visible ASCII are kept, decoded lossily as UTF-8.
fn header_map(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let value = match value.to_str() {
            Ok(value) => value.to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        map.entry(name.as_str().to_string()).or_default().push(value);
    }
    map
}
