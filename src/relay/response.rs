use bytes::Bytes;
use http::header::{self, HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use tracing::{debug, error, warn};

use super::cors::CorsHeaders;
use crate::error::RelayError;
use crate::io::UpstreamResponse;

/// Content type assumed when the data API does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Content type of relay-generated messages.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Body used for transport failures when error redaction is enabled.
pub const REDACTED_UPSTREAM_MESSAGE: &str = "Upstream request failed";

/// Connection-scoped headers that are never forwarded.
const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
];

/// A response ready to be sent back to the caller.
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RelayResponse {
    /// Preflight answer: 204, empty body, CORS headers only.
    pub fn preflight(cors: &CorsHeaders) -> Self {
        let mut headers = HeaderMap::new();
        cors.apply(&mut headers);
        Self {
            status: StatusCode::NO_CONTENT,
            headers,
            body: Bytes::new(),
        }
    }

    /// Relay the upstream answer.
    ///
    /// Status and body are kept as received. Headers are copied, then content-type
    /// is defaulted, then the CORS headers are written over whatever upstream sent.
    pub fn compose(upstream: UpstreamResponse, cors: &CorsHeaders) -> Self {
        let mut headers = HeaderMap::with_capacity(upstream.headers.len() + 4);
        for (name, value) in upstream.headers.iter() {
            if is_hop_by_hop(name) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        }

        cors.apply(&mut headers);

        Self {
            status: upstream.status,
            headers,
            body: upstream.body,
        }
    }

    /// Turn a terminal pipeline error into a response the browser can read.
    ///
    /// Auth failures carry the endpoint's own body. Transport failures carry the
    /// error message unless `redact` is set.
    pub fn from_error(err: RelayError, cors: &CorsHeaders, redact: bool) -> Self {
        let status = err.status();
        log_error(&err, status);

        let (content_type, body) = match err {
            RelayError::Auth {
                content_type, body, ..
            } => (
                content_type.unwrap_or_else(|| HeaderValue::from_static(TEXT_CONTENT_TYPE)),
                body,
            ),
            RelayError::Upstream(_) if redact => (
                HeaderValue::from_static(TEXT_CONTENT_TYPE),
                Bytes::from_static(REDACTED_UPSTREAM_MESSAGE.as_bytes()),
            ),
            other => (
                HeaderValue::from_static(TEXT_CONTENT_TYPE),
                Bytes::from(other.to_string()),
            ),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type);
        cors.apply(&mut headers);

        Self {
            status,
            headers,
            body,
        }
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    name == CONTENT_LENGTH
        || HOP_BY_HOP.contains(name)
        || name.as_str() == "keep-alive"
        || name.as_str() == "proxy-connection"
}

/// Log errors based on severity: 5xx at ERROR, rejected requests at WARN,
/// upstream auth refusals at DEBUG (already logged by the exchanger).
fn log_error(err: &RelayError, status: StatusCode) {
    if status.is_server_error() {
        error!(
            error_type = err.kind(),
            status = status.as_u16(),
            "Relay error: {}",
            err
        );
    } else if matches!(err, RelayError::Auth { .. }) {
        debug!(
            error_type = err.kind(),
            status = status.as_u16(),
            "Auth failure relayed to caller"
        );
    } else {
        warn!(
            error_type = err.kind(),
            status = status.as_u16(),
            "Client error: {}",
            err
        );
    }
}
