//! Cache lookup and population around outbound requests
//!
//! The controller is consulted before a request is sent (`check_cache`) and
//! after a live response arrives (`update_cache`). Freshness is decided from
//! the `Date` header of the stored response; stale entries are deleted when
//! they are found.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use tracing::debug;

use super::{derive_key, CacheError, CacheStore};
use crate::http::{Request, Response, DATE_HEADER};

/// Default freshness window in seconds
pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;

/// Header stamped on responses served from the cache
pub const DEFAULT_MARKER_HEADER: &str = "X-From-Cache";

/// Value of the marker header on cache hits
const MARKER_VALUE: &str = "1";

/// IMF-fixdate, the preferred HTTP date format
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Obsolete HTTP date formats recipients must still accept: RFC 850 and asctime
const OBSOLETE_HTTP_DATE_FORMATS: [&str; 2] =
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"];

/// Immutable cache settings, fixed when a client is built
#[derive(Clone)]
pub struct CacheConfig {
    /// Backing store; `None` disables caching
    store: Option<Arc<dyn CacheStore>>,
    /// Maximum age of an entry before it is considered stale
    max_age: Duration,
    /// Header added to cache hits, if any
    marker_header: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: None,
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
            marker_header: Some(DEFAULT_MARKER_HEADER.to_string()),
        }
    }
}

impl CacheConfig {
    /// Creates a config that caches into the given store with default settings
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Creates a config with caching turned off
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Sets the freshness window
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets the freshness window in seconds
    pub fn with_max_age_secs(self, secs: u64) -> Self {
        self.with_max_age(Duration::from_secs(secs))
    }

    /// Sets the header stamped on cache hits; an empty name disables it
    pub fn with_marker_header(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.marker_header = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn store(&self) -> Option<&Arc<dyn CacheStore>> {
        self.store.as_ref()
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn marker_header(&self) -> Option<&str> {
        self.marker_header.as_deref()
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("store", &self.store.as_ref().map(|s| s.name()))
            .field("max_age", &self.max_age)
            .field("marker_header", &self.marker_header)
            .finish()
    }
}

/// Reads and writes cached responses for a client
///
/// Holds no state besides its configuration; concurrent use is safe as long
/// as the store is.
#[derive(Debug, Clone, Default)]
pub struct CacheController {
    config: CacheConfig,
}

impl CacheController {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether a store is configured
    pub fn is_enabled(&self) -> bool {
        self.config.store.is_some()
    }

    /// Looks up a fresh cached response for the request
    ///
    /// # Returns
    /// * `Ok(Some(Response))` - A fresh entry, stamped with the marker header if configured
    /// * `Ok(None)` - No store, no entry, no `Date` header, or a stale entry (which is deleted)
    /// * `Err(CacheError)` - Key derivation or deserialization failed
    pub fn check_cache(&self, request: &Request) -> Result<Option<Response>, CacheError> {
        self.check_cache_at(request, Utc::now())
    }

    /// Same as [`check_cache`](Self::check_cache), evaluated at `now`
    pub fn check_cache_at(
        &self,
        request: &Request,
        now: DateTime<Utc>,
    ) -> Result<Option<Response>, CacheError> {
        let Some(store) = self.config.store.as_deref() else {
            debug!("no cache configured");
            return Ok(None);
        };

        let key = derive_key(request)?;
        debug!(key = %key, store = store.name(), "looking up cached response");

        let Some(data) = store.get(&key) else {
            debug!(key = %key, "no cached response found");
            return Ok(None);
        };

        let mut response: Response =
            serde_json::from_slice(&data).map_err(CacheError::Deserialization)?;

        // An entry whose age cannot be determined is never served
        let Some(date) = response.header(DATE_HEADER) else {
            debug!(key = %key, "cached response has no Date header");
            return Ok(None);
        };

        let stale = match parse_http_date(date) {
            Some(stored_at) => self.is_stale(stored_at, now),
            None => {
                debug!(key = %key, date, "cached response has an unparseable Date header");
                true
            }
        };

        if stale {
            debug!(key = %key, "cached response is too old");
            store.delete(&key);
            return Ok(None);
        }

        if let Some(marker) = self.config.marker_header.as_deref() {
            response.headers.retain(|name, _| !name.eq_ignore_ascii_case(marker));
            response
                .headers
                .insert(marker.to_string(), vec![MARKER_VALUE.to_string()]);
        }

        debug!(key = %key, "returning cached response");
        Ok(Some(response))
    }

    /// Stores a live response for later lookups
    ///
    /// Does nothing when no store is configured, when there is no response,
    /// or when the status is not 200. Errors returned here should be logged
    /// by the caller; the live response stays usable.
    pub fn update_cache(
        &self,
        request: &Request,
        response: Option<&Response>,
    ) -> Result<(), CacheError> {
        self.update_cache_at(request, response, Utc::now())
    }

    /// Same as [`update_cache`](Self::update_cache), with `now` used for a missing `Date` header
    pub fn update_cache_at(
        &self,
        request: &Request,
        response: Option<&Response>,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let Some(store) = self.config.store.as_deref() else {
            debug!("no cache configured");
            return Ok(());
        };

        let Some(response) = response else {
            return Ok(());
        };

        if response.status_code != 200 {
            debug!(
                status = response.status_code,
                "not storing response with non-200 status"
            );
            return Ok(());
        }

        let key = derive_key(request)?;

        let entry = if response.has_header(DATE_HEADER) {
            Cow::Borrowed(response)
        } else {
            let date = format_http_date(now);
            debug!(date = %date, "adding Date header to response");
            let mut owned = response.clone();
            owned.headers.insert(DATE_HEADER.to_string(), vec![date]);
            Cow::Owned(owned)
        };

        let data = serde_json::to_vec(entry.as_ref()).map_err(CacheError::Serialization)?;

        debug!(key = %key, bytes = data.len(), "storing response");
        store.set(&key, &data);

        Ok(())
    }

    fn is_stale(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = now - stored_at;
        match TimeDelta::from_std(self.config.max_age) {
            Ok(max_age) => age > max_age,
            // Windows beyond chrono's range never expire
            Err(_) => false,
        }
    }
}

/// Formats a timestamp as an HTTP date
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Parses an HTTP date
///
/// Accepts IMF-fixdate (and any RFC 2822 form), plus the obsolete RFC 850
/// and asctime forms. The obsolete forms are always UTC.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(time) = DateTime::parse_from_rfc2822(value) {
        return Some(time.with_timezone(&Utc));
    }

    OBSOLETE_HTTP_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
