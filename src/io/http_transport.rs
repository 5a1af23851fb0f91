use std::time::Duration;

use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION};
use http::HeaderValue;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::transport::{bearer_header, UpstreamRequest, UpstreamResponse, UpstreamTransport};
use crate::error::TransportError;

/// Default bound on a single outbound call (connect + send + full body).
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on establishing a connection to either remote.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `reqwest`-backed implementation of `UpstreamTransport`.
///
/// A single pooled client is shared by all requests. The total timeout applies to
/// each call individually, so a request that authenticates and then reads may
/// take up to twice the bound.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the given per-call and connect timeouts.
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("ethos-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Wrap an existing client. `timeout` is only used for error reporting.
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The per-call timeout this transport reports on expiry.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<UpstreamResponse, TransportError> {
        let response = builder.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::Body(e.to_string())
            }
        })?;

        Ok(UpstreamResponse::new(status, headers, body))
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn authenticate(
        &self,
        endpoint: &Url,
        secret: &SecretString,
    ) -> Result<UpstreamResponse, TransportError> {
        debug!(endpoint = %endpoint, "Exchanging secret for bearer token");

        let builder = self
            .client
            .post(endpoint.clone())
            .header(ACCEPT, HeaderValue::from_static("*/*"))
            .header(AUTHORIZATION, bearer_header(secret.expose_secret())?);

        self.execute(builder).await
    }

    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        debug!(url = %request.url, "Fetching upstream resource");

        let authorization = request.token.authorization()?;
        let builder = self
            .client
            .get(request.url)
            .header(ACCEPT, request.accept)
            .header(AUTHORIZATION, authorization);

        self.execute(builder).await
    }
}
