//! Relay pipeline.
//!
//! This module turns one inbound browser request into one authenticated read
//! against the Ethos Integration API and relays the answer back.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ InboundRequest
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              RelayService               │
//! │  gate → path → credentials → query      │
//! │                    → fetch → response   │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │      UpstreamTransport (io module)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`RelayService`]: Runs the stages in order, turning errors into responses
//! - [`gate`]: Method gate (GET proceeds, OPTIONS is a preflight, others 405)
//! - [`path`]: Resolves `/ethos/<model>[/<id>]` to the upstream resource path
//! - [`credentials`]: Exchanges the process secret for a one-shot bearer token
//! - [`query`]: Builds the upstream URL with the forced `limit=1`
//! - [`RelayResponse`]: Composes the response and attaches [`CorsHeaders`]

mod cors;
pub mod credentials;
pub mod gate;
pub mod path;
pub mod query;
mod response;
mod service;

pub use cors::{CorsHeaders, ALLOWED_HEADERS, ALLOWED_METHODS};
pub use gate::{check_method, MethodGate};
pub use query::{upstream_url, FORCED_PAGE_SIZE, PAGE_SIZE_KEY};
pub use response::{
    RelayResponse, DEFAULT_CONTENT_TYPE, REDACTED_UPSTREAM_MESSAGE, TEXT_CONTENT_TYPE,
};
pub use service::{
    InboundRequest, RelayService, RelaySettings, DEFAULT_API_BASE, DEFAULT_AUTH_URL,
};
