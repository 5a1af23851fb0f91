use http::header::CONTENT_TYPE;
use http::StatusCode;
use secrecy::SecretString;
use tracing::{debug, warn};
use url::Url;

use crate::error::RelayError;
use crate::io::{BearerToken, UpstreamTransport};

/// Body returned when the auth endpoint answers 2xx without a token.
pub const EMPTY_TOKEN_MESSAGE: &str = "Authentication endpoint returned an empty token";

/// Trade the process secret for a bearer token valid for one upstream call.
///
/// A non-success answer becomes `RelayError::Auth` carrying the endpoint's own
/// status and body. A success body is trimmed and used as the token.
pub async fn exchange<T>(
    transport: &T,
    endpoint: &Url,
    secret: &SecretString,
) -> Result<BearerToken, RelayError>
where
    T: UpstreamTransport + ?Sized,
{
    let response = transport.authenticate(endpoint, secret).await?;

    if !response.status.is_success() {
        warn!(
            status = response.status.as_u16(),
            "Authentication endpoint rejected the secret"
        );
        return Err(RelayError::Auth {
            status: response.status,
            content_type: response.headers.get(CONTENT_TYPE).cloned(),
            body: response.body,
        });
    }

    let token = String::from_utf8_lossy(&response.body).trim().to_string();
    if token.is_empty() {
        warn!("Authentication endpoint returned an empty token");
        return Err(RelayError::Auth {
            status: StatusCode::BAD_GATEWAY,
            content_type: None,
            body: EMPTY_TOKEN_MESSAGE.into(),
        });
    }

    debug!(token_len = token.len(), "Obtained bearer token");
    Ok(BearerToken::new(token))
}
