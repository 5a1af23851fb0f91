use std::time::Duration;

use bytes::Bytes;
use http::{HeaderValue, StatusCode};
use thiserror::Error;

/// Errors raised while talking to the authentication endpoint or the data API.
///
/// These cover failures to reach a remote at all. A remote that answers with an
/// error status is not a transport error; its response is relayed as-is.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The outbound call did not complete within the configured bound
    #[error("Upstream request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The outbound request could not be built (e.g. a header with invalid bytes)
    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),

    /// The response started but its body could not be read in full
    #[error("Failed to read upstream body: {0}")]
    Body(String),
}

/// Request validation failures, produced before any outbound call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Path is not `/ethos/<model>` or `/ethos/<model>/<id>`
    #[error("Use /ethos/<model> or /ethos/<model>/<id>")]
    InvalidPath,

    /// The caller did not send a usable `Accept` header
    #[error("Missing required Accept header (e.g. application/vnd.hedtech.integration.vX+json)")]
    MissingAccept,
}

/// Terminal errors for a single relayed request.
///
/// Every variant is converted into an HTTP response carrying CORS headers;
/// none of them is retried.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// Any method other than GET or OPTIONS
    #[error("Only GET is supported")]
    MethodNotAllowed,

    /// Bad path shape or missing required header
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The authentication endpoint refused the secret or returned no token
    #[error("Auth failed with status {status}")]
    Auth {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },

    /// One of the remotes could not be reached
    #[error("{0}")]
    Upstream(#[from] TransportError),
}

impl RelayError {
    /// HTTP status reported to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Auth { status, .. } => *status,
            RelayError::Upstream(TransportError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short machine-readable label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MethodNotAllowed => "method_not_allowed",
            RelayError::Validation(ValidationError::InvalidPath) => "invalid_path",
            RelayError::Validation(ValidationError::MissingAccept) => "missing_accept",
            RelayError::Auth { .. } => "auth_failed",
            RelayError::Upstream(TransportError::Timeout(_)) => "upstream_timeout",
            RelayError::Upstream(_) => "upstream_error",
        }
    }
}
