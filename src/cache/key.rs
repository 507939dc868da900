//! Cache key derivation
//!
//! A cache key is the canonical URL of a GET request with the API key left
//! out, so requests made with different credentials share one entry.

use super::CacheError;
use crate::http::{build_url, Method, Request, AUTH_QUERY_PARAM};

/// Derives the cache key for a request
///
/// # Returns
/// * `Ok(String)` - The canonical URL without the authentication parameter
/// * `Err(CacheError::UnsupportedMethod)` - If the request is not a GET
/// * `Err(CacheError::KeyDerivation)` - If the base URL cannot be parsed
pub fn derive_key(request: &Request) -> Result<String, CacheError> {
    if request.method != Method::Get {
        return Err(CacheError::UnsupportedMethod(request.method));
    }

    let params = request
        .query
        .iter()
        .filter(|(name, _)| name.as_str() != AUTH_QUERY_PARAM)
        .map(|(name, value)| (name.as_str(), value.as_str()));

    let url = build_url(&request.base_url, params)?;

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interrogate_request(key: &str) -> Request {
        Request::get("https://api.example/combinations/interrogate")
            .with_header("User-Agent", "test")
            .with_query("key", key)
            .with_query("dhcp_fingerprint", "1,15,3,6")
    }

    #[test]
    fn test_key_excludes_auth_parameter() {
        let key = derive_key(&interrogate_request("secret")).unwrap();

        assert_eq!(
            key,
            "https://api.example/combinations/interrogate?dhcp_fingerprint=1%2C15%2C3%2C6"
        );
        assert!(!key.contains("secret"));
        assert!(!key.contains("key="));
    }

    #[test]
    fn test_key_is_stable_under_auth_rotation() {
        let first = derive_key(&interrogate_request("secret")).unwrap();
        let second = derive_key(&interrogate_request("other-secret")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_key_independent_of_insertion_order() {
        let a = Request::get("https://api.example/combinations/interrogate")
            .with_query("mac", "aabbccddeeff")
            .with_query("dhcp_fingerprint", "1,15,3,6");
        let b = Request::get("https://api.example/combinations/interrogate")
            .with_query("dhcp_fingerprint", "1,15,3,6")
            .with_query("mac", "aabbccddeeff");

        assert_eq!(derive_key(&a).unwrap(), derive_key(&b).unwrap());
    }

    #[test]
    fn test_key_differs_on_other_parameters() {
        let a = interrogate_request("secret");
        let b = interrogate_request("secret").with_query("dhcp_fingerprint", "1,3,6");

        assert_ne!(derive_key(&a).unwrap(), derive_key(&b).unwrap());
    }

    #[test]
    fn test_key_ignores_headers() {
        let a = interrogate_request("secret");
        let b = interrogate_request("secret").with_header("User-Agent", "other");

        assert_eq!(derive_key(&a).unwrap(), derive_key(&b).unwrap());
    }

    #[test]
    fn test_key_leaves_request_unchanged() {
        let request = interrogate_request("secret");
        let before = request.clone();

        derive_key(&request).unwrap();

        assert_eq!(request, before);
        assert_eq!(request.query.get("key").map(String::as_str), Some("secret"));
    }

    #[test]
    fn test_key_for_auth_only_request_is_bare_url() {
        let request = Request::get("https://api.example/devices/base_info").with_query("key", "s");

        assert_eq!(
            derive_key(&request).unwrap(),
            "https://api.example/devices/base_info"
        );
    }

    #[test]
    fn test_non_get_methods_are_rejected() {
        for method in [Method::Post, Method::Put, Method::Patch, Method::Delete] {
            let mut request = interrogate_request("secret");
            request.method = method;

            let err = derive_key(&request).unwrap_err();
            assert!(
                matches!(err, CacheError::UnsupportedMethod(m) if m == method),
                "expected UnsupportedMethod for {}",
                method
            );
        }
    }

    #[test]
    fn test_invalid_base_url_is_key_derivation_error() {
        let request = Request::get("not a url").with_query("key", "secret");

        let err = derive_key(&request).unwrap_err();
        assert!(matches!(err, CacheError::KeyDerivation(_)));
    }
}
