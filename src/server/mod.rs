//! HTTP server layer for the relay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │          GET /ethos/<model>[/<id>]   OPTIONS /*                 │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (relay, cors guard,      │  │  (router, layers, tracing)  │  │
//! │  │  panic response)         │  │                             │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{cors_guard, panic_response, relay_handler, AppState, PANIC_MESSAGE};
pub use routes::{create_router, RouterConfig};
