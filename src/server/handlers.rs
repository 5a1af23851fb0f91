//! HTTP request handlers for the relay.
//!
//! Every inbound request, whatever its method or path, is handed to
//! [`relay_handler`]; routing decisions are part of the relay pipeline itself.

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::io::UpstreamTransport;
use crate::relay::{CorsHeaders, InboundRequest, RelayResponse, RelayService, TEXT_CONTENT_TYPE};

/// Body returned when a handler panics.
pub const PANIC_MESSAGE: &str = "Internal relay error";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the relay service.
///
/// This is passed to the handler via Axum's State extractor.
pub struct AppState<T: UpstreamTransport> {
    pub relay: Arc<RelayService<T>>,
}

impl<T: UpstreamTransport> AppState<T> {
    pub fn new(relay: RelayService<T>) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

impl<T: UpstreamTransport> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
        }
    }
}

// =============================================================================
// Response Mapping
// =============================================================================

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Relay any inbound request.
///
/// # Response
///
/// - `204 No Content`: preflight (`OPTIONS` on any path)
/// - `400 Bad Request`: path is not `/ethos/<model>[/<id>]`, or `Accept` is missing
/// - `405 Method Not Allowed`: any method other than GET/OPTIONS
/// - `502`/`504`: the authentication endpoint or data API could not be reached
/// - anything else: the auth endpoint's status on auth failure, otherwise the
///   data API's status and body
pub async fn relay_handler<T>(State(state): State<AppState<T>>, request: Request) -> Response
where
    T: UpstreamTransport + 'static,
{
    // The body of a read is ignored; dropping it here releases the connection early.
    let (parts, _body) = request.into_parts();
    let inbound = InboundRequest::from_parts(&parts);

    state.relay.handle(inbound).await.into_response()
}

/// Re-apply the CORS headers on the way out.
///
/// The relay already attaches them to every response it builds; this covers
/// responses produced outside it (a caught panic, for instance).
pub async fn cors_guard(request: Request, next: Next) -> Response {
    let cors = CorsHeaders::from_request_headers(request.headers());
    let mut response = next.run(request).await;
    cors.apply(response.headers_mut());
    response
}

/// Convert a handler panic into a plain 500 response.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail: &str = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else {
        "unknown panic payload"
    };

    error!(status = 500, "Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE))],
        PANIC_MESSAGE,
    )
        .into_response()
}
