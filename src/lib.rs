//! # Ethos Relay
//!
//! A read-only HTTP relay in front of the Ellucian Ethos Integration API.
//!
//! Browsers cannot hold the application secret the Ethos API wants, and the
//! API does not answer cross-origin reads. The relay keeps the secret on the
//! server, exchanges it for a fresh bearer token on every request, forwards a
//! single-record read upstream, and hands the answer back with CORS headers.
//!
//! ## Features
//!
//! - **Path mapping**: `/ethos/<model>[/<id>]` becomes `<api-base>/<model>[/<id>]`
//! - **Forced page size**: every upstream read carries `limit=1`
//! - **Per-request credentials**: no token is cached between requests
//! - **CORS**: every response, errors included, carries the same four headers
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`io`] - Outbound transport (authentication call and data read)
//! - [`relay`] - The per-request pipeline and response composition
//! - [`server`] - Axum-based HTTP server and middleware
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types and their HTTP status mapping
//!
//! ## Example
//!
//! ```rust,no_run
//! use ethos_relay::{create_router, HttpTransport, RelayService, RelaySettings, RouterConfig};
//! use ethos_relay::io::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_UPSTREAM_TIMEOUT};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = RelaySettings::new(
//!         Url::parse("https://integrate.elluciancloud.com/auth")?,
//!         Url::parse("https://integrate.elluciancloud.com/api")?,
//!         "my-app-secret",
//!     );
//!     let transport = HttpTransport::new(DEFAULT_UPSTREAM_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)?;
//!     let router = create_router(RelayService::new(transport, settings), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8787").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod relay;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use error::{RelayError, TransportError, ValidationError};
pub use io::{BearerToken, HttpTransport, UpstreamRequest, UpstreamResponse, UpstreamTransport};
pub use relay::{CorsHeaders, InboundRequest, RelayResponse, RelayService, RelaySettings};
pub use server::{create_router, AppState, RouterConfig};
