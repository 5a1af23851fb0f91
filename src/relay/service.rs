//! Relay Service: the per-request pipeline.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         RelayService::handle()                   │
//! │                                                                  │
//! │  1. Method gate ──► OPTIONS: 204 preflight                       │
//! │  2. Path resolver   /ethos/<model>[/<id>] → <model>[/<id>]       │
//! │  3. Accept check    (before any outbound call)                   │
//! │  4. Credential exchange ──► UpstreamTransport::authenticate      │
//! │  5. Upstream read ────────► UpstreamTransport::fetch             │
//! │  6. Compose response (headers, content-type, CORS)               │
//! │                                                                  │
//! │  Any stage may short-circuit with a RelayError, which is turned  │
//! │  into a response carrying CORS headers.                          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is carried between calls: every request re-authenticates and the
//! token is dropped once the upstream read has been sent.

use std::fmt;
use std::time::Instant;

use http::header::{ACCEPT, ORIGIN};
use http::request::Parts;
use http::{HeaderValue, Method};
use secrecy::SecretString;
use tracing::{debug, info};
use url::Url;

use super::cors::CorsHeaders;
use super::credentials;
use super::gate::{check_method, MethodGate};
use super::path;
use super::query::upstream_url;
use super::response::RelayResponse;
use crate::error::{RelayError, ValidationError};
use crate::io::{UpstreamRequest, UpstreamTransport};

/// Default authentication endpoint of the Ethos Integration service.
pub const DEFAULT_AUTH_URL: &str = "https://integrate.elluciancloud.com/auth";

/// Default base URL of the Ethos Integration data API.
pub const DEFAULT_API_BASE: &str = "https://integrate.elluciancloud.com/api";

// =============================================================================
// Inbound Request
// =============================================================================

/// The parts of an inbound request the relay looks at.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,

    /// Raw (still percent-encoded) path
    pub path: String,

    /// Raw query string without the leading `?`
    pub query: Option<String>,

    /// Caller's `Accept`, present only if non-blank
    pub accept: Option<HeaderValue>,

    /// Caller's `Origin`, echoed into the CORS headers
    pub origin: Option<HeaderValue>,
}

impl InboundRequest {
    /// Build from a request path-and-query such as `/ethos/persons?limit=5`.
    pub fn new(method: Method, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path_and_query.to_string(), None),
        };

        Self {
            method,
            path,
            query,
            accept: None,
            origin: None,
        }
    }

    /// Set the caller's `Accept` header (blank values count as absent).
    pub fn with_accept(mut self, accept: HeaderValue) -> Self {
        self.accept = usable_accept(Some(&accept));
        self
    }

    /// Set the caller's `Origin` header.
    pub fn with_origin(mut self, origin: HeaderValue) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Extract the relay-relevant parts of an HTTP request.
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            accept: usable_accept(parts.headers.get(ACCEPT)),
            origin: parts.headers.get(ORIGIN).cloned(),
        }
    }
}

/// Any non-blank value counts, including obs-text bytes; it is forwarded as-is.
fn usable_accept(value: Option<&HeaderValue>) -> Option<HeaderValue> {
    let value = value?;
    if value.as_bytes().trim_ascii().is_empty() {
        None
    } else {
        Some(value.clone())
    }
}

// =============================================================================
// Relay Settings
// =============================================================================

/// Process-wide, read-only settings shared by every request.
#[derive(Clone)]
pub struct RelaySettings {
    /// Endpoint the secret is exchanged at
    pub auth_url: Url,

    /// Base URL the resolved resource path is appended to
    pub api_base: Url,

    /// Long-lived credential; never logged or returned
    pub secret: SecretString,

    /// Replace transport error messages with a generic body
    pub redact_errors: bool,
}

impl RelaySettings {
    /// Create settings for the given endpoints. Error redaction is off.
    pub fn new(auth_url: Url, api_base: Url, secret: impl Into<String>) -> Self {
        Self {
            auth_url,
            api_base,
            secret: SecretString::from(secret.into()),
            redact_errors: false,
        }
    }

    pub fn with_redact_errors(mut self, redact: bool) -> Self {
        self.redact_errors = redact;
        self
    }
}

impl fmt::Debug for RelaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySettings")
            .field("auth_url", &self.auth_url.as_str())
            .field("api_base", &self.api_base.as_str())
            .field("secret", &"[REDACTED]")
            .field("redact_errors", &self.redact_errors)
            .finish()
    }
}

// =============================================================================
// Relay Service
// =============================================================================

/// Runs the relay pipeline for one inbound request at a time.
///
/// # Type Parameters
///
/// * `T` - The transport used for the two outbound calls
pub struct RelayService<T: UpstreamTransport> {
    transport: T,
    settings: RelaySettings,
}

impl<T: UpstreamTransport> RelayService<T> {
    pub fn new(transport: T, settings: RelaySettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle one inbound request. Never fails: errors become responses.
    pub async fn handle(&self, request: InboundRequest) -> RelayResponse {
        let start = Instant::now();
        let cors = CorsHeaders::for_origin(request.origin.as_ref());

        let response = match self.process(&request, &cors).await {
            Ok(response) => response,
            Err(err) => RelayResponse::from_error(err, &cors, self.settings.redact_errors),
        };

        info!(
            method = %request.method,
            path = %request.path,
            status = response.status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Relayed request"
        );

        response
    }

    async fn process(
        &self,
        request: &InboundRequest,
        cors: &CorsHeaders,
    ) -> Result<RelayResponse, RelayError> {
        if check_method(&request.method)? == MethodGate::Preflight {
            return Ok(RelayResponse::preflight(cors));
        }

        let resource = path::resolve(&request.path)?;
        let accept = request
            .accept
            .clone()
            .ok_or(ValidationError::MissingAccept)?;
        let url = upstream_url(&self.settings.api_base, &resource, request.query.as_deref())?;

        debug!(resource = %resource, "Resolved upstream resource");

        let token = credentials::exchange(
            &self.transport,
            &self.settings.auth_url,
            &self.settings.secret,
        )
        .await?;

        let upstream = self
            .transport
            .fetch(UpstreamRequest { url, accept, token })
            .await?;

        debug!(
            status = upstream.status.as_u16(),
            bytes = upstream.body.len(),
            "Upstream responded"
        );

        Ok(RelayResponse::compose(upstream, cors))
    }
}
