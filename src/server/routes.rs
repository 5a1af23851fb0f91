//! Router configuration for the relay.
//!
//! The relay has no route table: a single fallback handler receives every
//! request and the pipeline decides what to do with it.
//!
//! # Layers (outermost first)
//!
//! ```text
//! TraceLayer (optional)     - request/response spans
//! cors_guard                - CORS headers on every response
//! CatchPanicLayer           - panics become 500s
//! relay_handler             - the relay pipeline
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ethos_relay::io::{HttpTransport, DEFAULT_CONNECT_TIMEOUT, DEFAULT_UPSTREAM_TIMEOUT};
//! use ethos_relay::relay::{RelayService, RelaySettings};
//! use ethos_relay::server::{create_router, RouterConfig};
//!
//! let transport = HttpTransport::new(DEFAULT_UPSTREAM_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)?;
//! let relay = RelayService::new(transport, RelaySettings::new(auth_url, api_base, secret));
//! let router = create_router(relay, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8787").await?;
//! axum::serve(listener, router).await?;
//! ```

use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{cors_guard, panic_response, relay_handler, AppState};
use crate::io::UpstreamTransport;
use crate::relay::RelayService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with tracing enabled.
    pub fn new() -> Self {
        Self {
            enable_tracing: true,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router around a relay service.
pub fn create_router<T>(relay: RelayService<T>, config: RouterConfig) -> Router
where
    T: UpstreamTransport + 'static,
{
    let app_state = AppState::new(relay);

    let router = Router::new()
        .fallback(relay_handler::<T>)
        .with_state(app_state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(cors_guard));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
