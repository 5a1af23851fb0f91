//! End-to-end relay tests through the router.
//!
//! Tests verify:
//! - Preflight and method gating
//! - Path and Accept validation happening before any outbound call
//! - Credential exchange failures relayed as-is
//! - Upstream URL construction (forced `limit=1`, caller pairs kept)
//! - Response composition (status, body, content-type default, CORS)
//! - Transport failures and panics mapped to 5xx with CORS headers

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;
use url::Url;

use ethos_relay::error::TransportError;
use ethos_relay::io::{UpstreamRequest, UpstreamResponse, UpstreamTransport};
use ethos_relay::relay::{RelayService, REDACTED_UPSTREAM_MESSAGE};
use ethos_relay::server::PANIC_MESSAGE;
use ethos_relay::{create_router, RouterConfig};

use super::test_utils::{
    assert_cors_headers, ethos_get, relay_router, relay_router_with, test_settings,
    text_response, RecordedFetch, RecordingTransport, ETHOS_ACCEPT, TEST_SECRET,
};

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

// =============================================================================
// Preflight and Method Gate
// =============================================================================

#[tokio::test]
async fn test_preflight_on_any_path() {
    for uri in ["/ethos/students", "/", "/anything/else"] {
        let transport = RecordingTransport::new();
        let router = relay_router(&transport);

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_cors_headers(response.headers(), "*");
        assert!(body_bytes(response).await.is_empty());
        assert_eq!(transport.outbound_calls(), 0);
    }
}

#[tokio::test]
async fn test_preflight_echoes_origin() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/ethos/students")
        .header("origin", "https://portal.example.edu")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors_headers(response.headers(), "https://portal.example.edu");
}

#[tokio::test]
async fn test_non_get_methods_rejected() {
    for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
        let transport = RecordingTransport::new();
        let router = relay_router(&transport);

        let request = Request::builder()
            .method(method.clone())
            .uri("/ethos/students")
            .header("accept", ETHOS_ACCEPT)
            .body(Body::from("{}"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", method);
        assert_cors_headers(response.headers(), "*");
        assert_eq!(body_bytes(response).await, b"Only GET is supported");
        assert_eq!(transport.outbound_calls(), 0);
    }
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_paths_rejected() {
    for uri in [
        "/",
        "/students",
        "/ethos",
        "/ethos/",
        "/api/students",
        "/Ethos/students",
        "/ethos/../admin",
        "/ethos/%2E%2E/admin",
    ] {
        let transport = RecordingTransport::new();
        let router = relay_router(&transport);

        let response = router.oneshot(ethos_get(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_cors_headers(response.headers(), "*");
        assert_eq!(
            body_bytes(response).await,
            b"Use /ethos/<model> or /ethos/<model>/<id>"
        );
        assert_eq!(transport.outbound_calls(), 0, "{}", uri);
    }
}

#[tokio::test]
async fn test_backslash_cannot_leave_api_base() {
    for uri in ["/ethos/a\\..\\..\\auth", "/ethos/persons\\1"] {
        let transport = RecordingTransport::new();
        let router = relay_router(&transport);

        let response = router.oneshot(ethos_get(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_cors_headers(response.headers(), "*");
        assert_eq!(transport.outbound_calls(), 0, "{}", uri);
    }
}

#[tokio::test]
async fn test_encoded_backslash_stays_under_api_base() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    let response = router
        .oneshot(ethos_get("/ethos/a%5C..%5C..%5Cauth"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let url = Url::parse(&transport.fetches()[0].url).unwrap();
    assert_eq!(url.host_str(), Some("integrate.elluciancloud.com"));
    assert!(url.path().starts_with("/api/"));
}

#[tokio::test]
async fn test_non_ascii_accept_forwarded() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    let request = Request::builder()
        .uri("/ethos/students")
        .header(
            "accept",
            HeaderValue::from_bytes(b"application/vnd.caf\xe9+json").unwrap(),
        )
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.fetches().len(), 1);
    assert_eq!(
        transport.fetches()[0].accept,
        "application/vnd.caf\u{fffd}+json"
    );
}

#[tokio::test]
async fn test_missing_accept_rejected_without_outbound_calls() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    let request = Request::builder()
        .uri("/ethos/students")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors_headers(response.headers(), "*");
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.starts_with("Missing required Accept header"));
    assert_eq!(transport.outbound_calls(), 0);
}

#[tokio::test]
async fn test_blank_accept_counts_as_missing() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    let request = Request::builder()
        .uri("/ethos/students")
        .header("accept", "")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(transport.outbound_calls(), 0);
}

// =============================================================================
// Credential Exchange
// =============================================================================

#[tokio::test]
async fn test_auth_failure_relayed_and_read_skipped() {
    let transport = RecordingTransport::new()
        .with_auth(Ok(text_response(StatusCode::UNAUTHORIZED, "bad key")));
    let router = relay_router(&transport);

    let response = router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_cors_headers(response.headers(), "*");
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_bytes(response).await, b"bad key");

    assert_eq!(transport.auth_calls(), 1);
    assert!(transport.fetches().is_empty());
}

#[tokio::test]
async fn test_auth_endpoint_content_type_kept() {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    let transport = RecordingTransport::new().with_auth(Ok(UpstreamResponse::new(
        StatusCode::FORBIDDEN,
        headers,
        r#"{"message":"forbidden"}"#,
    )));
    let router = relay_router(&transport);

    let response = router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(body_bytes(response).await, br#"{"message":"forbidden"}"#);
}

#[tokio::test]
async fn test_empty_token_is_bad_gateway() {
    let transport =
        RecordingTransport::new().with_auth(Ok(text_response(StatusCode::OK, "  \n")));
    let router = relay_router(&transport);

    let response = router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_cors_headers(response.headers(), "*");
    assert!(transport.fetches().is_empty());
}

#[tokio::test]
async fn test_secret_presented_to_auth_endpoint() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(transport.secrets(), vec![TEST_SECRET.to_string()]);
}

// =============================================================================
// Upstream Read
// =============================================================================

#[tokio::test]
async fn test_end_to_end_read() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    let response = router
        .oneshot(ethos_get("/ethos/students?foo=bar&limit=50"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(response.headers(), "*");
    assert_eq!(body_bytes(response).await, b"[]");

    assert_eq!(
        transport.fetches(),
        vec![RecordedFetch {
            url: "https://integrate.elluciancloud.com/api/students?foo=bar&limit=1".to_string(),
            accept: ETHOS_ACCEPT.to_string(),
            token: "tok123".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_item_read_forces_limit() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    router
        .oneshot(ethos_get("/ethos/persons/8d3b1e2a-0000-4000-8000-000000000001"))
        .await
        .unwrap();

    let fetches = transport.fetches();
    assert_eq!(fetches.len(), 1);
    assert_eq!(
        fetches[0].url,
        "https://integrate.elluciancloud.com/api/persons/8d3b1e2a-0000-4000-8000-000000000001?limit=1"
    );
}

#[tokio::test]
async fn test_limit_override_any_case_dropped() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    router
        .oneshot(ethos_get("/ethos/sections?LIMIT=5&term=2024&Limit=9&term=2025"))
        .await
        .unwrap();

    let url = Url::parse(&transport.fetches()[0].url).unwrap();
    assert_eq!(url.query(), Some("term=2024&term=2025&limit=1"));
}

#[tokio::test]
async fn test_token_refreshed_per_request() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    for _ in 0..3 {
        let response = router
            .clone()
            .oneshot(ethos_get("/ethos/students"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(transport.auth_calls(), 3);
    assert_eq!(transport.fetches().len(), 3);
}

#[tokio::test]
async fn test_identical_requests_identical_responses() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    let first = router
        .clone()
        .oneshot(ethos_get("/ethos/students?x=1"))
        .await
        .unwrap();
    let second = router.oneshot(ethos_get("/ethos/students?x=1")).await.unwrap();

    assert_eq!(first.status(), second.status());
    assert_eq!(first.headers(), second.headers());
    assert_eq!(body_bytes(first).await, body_bytes(second).await);
}

// =============================================================================
// Response Composition
// =============================================================================

#[tokio::test]
async fn test_content_type_defaults_to_json() {
    let transport = RecordingTransport::new();
    let router = relay_router(&transport);

    let response = router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_upstream_headers_kept_and_cors_overwritten() {
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        HeaderValue::from_static("application/vnd.hedtech.integration.v12+json"),
    );
    headers.insert("x-total-count", HeaderValue::from_static("1234"));
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("https://elsewhere.example"),
    );
    headers.insert("connection", HeaderValue::from_static("keep-alive"));
    let transport = RecordingTransport::new().with_fetch(Ok(UpstreamResponse::new(
        StatusCode::OK,
        headers,
        r#"[{"id":"1"}]"#,
    )));
    let router = relay_router(&transport);

    let request = Request::builder()
        .uri("/ethos/students")
        .header("accept", ETHOS_ACCEPT)
        .header("origin", "https://portal.example.edu")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get("content-type").unwrap(),
        "application/vnd.hedtech.integration.v12+json"
    );
    assert_eq!(headers.get("x-total-count").unwrap(), "1234");
    assert!(headers.get("connection").is_none());
    assert_cors_headers(headers, "https://portal.example.edu");
    assert_eq!(
        headers.get_all("access-control-allow-origin").iter().count(),
        1
    );
}

#[tokio::test]
async fn test_upstream_error_status_relayed() {
    let transport = RecordingTransport::new()
        .with_fetch(Ok(text_response(StatusCode::NOT_FOUND, "no such resource")));
    let router = relay_router(&transport);

    let response = router
        .oneshot(ethos_get("/ethos/persons/missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors_headers(response.headers(), "*");
    assert_eq!(body_bytes(response).await, b"no such resource");
}

// =============================================================================
// Transport Failures
// =============================================================================

#[tokio::test]
async fn test_upstream_timeout_is_gateway_timeout() {
    let transport = RecordingTransport::new()
        .with_fetch(Err(TransportError::Timeout(Duration::from_secs(30))));
    let router = relay_router(&transport);

    let response = router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_cors_headers(response.headers(), "*");
}

#[tokio::test]
async fn test_auth_connection_failure_is_bad_gateway() {
    let transport = RecordingTransport::new()
        .with_auth(Err(TransportError::Connection("connection refused".to_string())));
    let router = relay_router(&transport);

    let response = router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_cors_headers(response.headers(), "*");
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("connection refused"));
    assert!(transport.fetches().is_empty());
}

#[tokio::test]
async fn test_redacted_transport_errors() {
    let transport = RecordingTransport::new()
        .with_fetch(Err(TransportError::Connection("dns error: internal.host".to_string())));
    let router = relay_router_with(&transport, test_settings().with_redact_errors(true));

    let response = router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_bytes(response).await,
        REDACTED_UPSTREAM_MESSAGE.as_bytes()
    );
}

#[tokio::test]
async fn test_redaction_keeps_auth_body() {
    let transport = RecordingTransport::new()
        .with_auth(Ok(text_response(StatusCode::UNAUTHORIZED, "bad key")));
    let router = relay_router_with(&transport, test_settings().with_redact_errors(true));

    let response = router.oneshot(ethos_get("/ethos/students")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(response).await, b"bad key");
}

// =============================================================================
// Panics
// =============================================================================

/// Transport whose data read panics.
struct PanickingTransport;

#[async_trait]
impl UpstreamTransport for PanickingTransport {
    async fn authenticate(
        &self,
        _endpoint: &Url,
        _secret: &SecretString,
    ) -> Result<UpstreamResponse, TransportError> {
        Ok(text_response(StatusCode::OK, "tok123"))
    }

    async fn fetch(&self, _request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        panic!("transport exploded");
    }
}

#[tokio::test]
async fn test_panic_becomes_internal_error_with_cors() {
    let relay = RelayService::new(PanickingTransport, test_settings());
    let router = create_router(relay, RouterConfig::new().with_tracing(false));

    let request = Request::builder()
        .uri("/ethos/students")
        .header("accept", ETHOS_ACCEPT)
        .header("origin", "https://portal.example.edu")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors_headers(response.headers(), "https://portal.example.edu");
    assert_eq!(body_bytes(response).await, PANIC_MESSAGE.as_bytes());
}
