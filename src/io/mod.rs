//! Outbound I/O for the relay.
//!
//! Two calls leave the process per relayed request: the credential exchange
//! against the authentication endpoint and the read against the data API.
//! Both go through [`UpstreamTransport`]; [`HttpTransport`] is the `reqwest`
//! implementation used by the binary.

mod http_transport;
mod transport;

pub use http_transport::{HttpTransport, DEFAULT_CONNECT_TIMEOUT, DEFAULT_UPSTREAM_TIMEOUT};
pub use transport::{
    bearer_header, BearerToken, UpstreamRequest, UpstreamResponse, UpstreamTransport,
};
