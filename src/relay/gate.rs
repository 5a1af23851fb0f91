use http::Method;

use crate::error::RelayError;

/// Outcome of the method gate for a request that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodGate {
    /// `OPTIONS`: answer the preflight directly, nothing is forwarded
    Preflight,

    /// `GET`: continue to path resolution
    Proceed,
}

/// Admit `GET`, short-circuit `OPTIONS`, reject everything else.
pub fn check_method(method: &Method) -> Result<MethodGate, RelayError> {
    if method == Method::OPTIONS {
        Ok(MethodGate::Preflight)
    } else if method == Method::GET {
        Ok(MethodGate::Proceed)
    } else {
        Err(RelayError::MethodNotAllowed)
    }
}
