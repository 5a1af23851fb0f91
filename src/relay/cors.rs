//! Cross-origin headers attached to every relay response.
//!
//! The relay does not use a generic CORS layer: the header set is fixed, the
//! allowed origin is whatever the caller sent, and the headers must be present
//! on non-preflight responses (including errors) so the browser can read the body.

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, VARY,
};
use http::{HeaderMap, HeaderValue};

/// Methods advertised to browsers.
pub const ALLOWED_METHODS: &str = "GET,OPTIONS";

/// Request headers advertised to browsers.
pub const ALLOWED_HEADERS: &str = "Accept,Content-Type";

/// The four CORS headers computed for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
}

impl CorsHeaders {
    /// Compute the header set for a caller's `Origin`, falling back to `*`.
    pub fn for_origin(origin: Option<&HeaderValue>) -> Self {
        let allow_origin = origin
            .filter(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));
        Self { allow_origin }
    }

    /// Read `Origin` from request headers.
    pub fn from_request_headers(headers: &HeaderMap) -> Self {
        Self::for_origin(headers.get(http::header::ORIGIN))
    }

    pub fn allow_origin(&self) -> &HeaderValue {
        &self.allow_origin
    }

    /// Set or overwrite the CORS headers on `headers`.
    ///
    /// Any value already present under these names (e.g. copied from upstream)
    /// is replaced.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
}
