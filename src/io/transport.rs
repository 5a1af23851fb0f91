use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::TransportError;

/// Trait for the two outbound calls the relay makes per request.
///
/// This abstraction keeps the pipeline independent of the HTTP client, so the
/// relay can be exercised against recording stubs. Implementations must be
/// thread-safe; one instance is shared by every in-flight request.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    /// `POST` to the authentication endpoint, presenting `secret` as a bearer credential.
    ///
    /// Any status the endpoint answers with is returned as `Ok`; only failures to
    /// obtain a response at all are errors.
    async fn authenticate(
        &self,
        endpoint: &Url,
        secret: &SecretString,
    ) -> Result<UpstreamResponse, TransportError>;

    /// Issue the authenticated read against the data API.
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}

/// Short-lived credential for exactly one upstream call.
///
/// Consumed by value when the upstream request is built, so a token cannot be
/// presented twice.
pub struct BearerToken(SecretString);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Render the `Authorization` header value for this token.
    pub fn authorization(&self) -> Result<HeaderValue, TransportError> {
        bearer_header(self.0.expose_secret())
    }

    /// Access the raw token (for test assertions and transports).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// Build a `Bearer <credential>` header value, marked sensitive.
pub fn bearer_header(credential: &str) -> Result<HeaderValue, TransportError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", credential)).map_err(|_| {
        TransportError::InvalidRequest("credential contains invalid header bytes".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// The authenticated read sent to the data API.
#[derive(Debug)]
pub struct UpstreamRequest {
    /// Fully built URL including the filtered query and `limit=1`
    pub url: Url,

    /// Content-negotiation header copied from the caller
    pub accept: HeaderValue,

    /// Token obtained from the credential exchange for this request
    pub token: BearerToken,
}

/// A fully buffered response from either remote.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}
