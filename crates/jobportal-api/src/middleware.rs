//! API middleware.
//!
//! The request pipeline stages, outermost first:
//! sanitize → security headers → XSS filter → JSON body → CORS → logging.
//! See [`crate::routes::create_router`] for how they are stacked.

use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderName};
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, HeaderValue, Method, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::sanitize;

/// Request body limit shared by every stage that buffers a JSON body.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// Headers set on every response.
///
/// Content-Security-Policy is handled separately so a handler can supply
/// its own.
const SECURITY_HEADERS: [(&str, &str); 11] = [
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Default Content-Security-Policy.
pub const DEFAULT_CSP: &str = "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';\
script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';\
upgrade-insecure-requests";

// =============================================================================
// Sanitize
// =============================================================================

/// Strip query-operator keys from JSON bodies and query strings.
///
/// This stage sits outside [`security_headers`], so its own rejections
/// (a streamed body that overflows the limit, an unrebuildable URI) get
/// the security headers applied here.
pub async fn sanitize_input(
    State(limit): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    let request = match rewrite_query(request, sanitize::strip_query_operators) {
        Ok(r) => r,
        Err(e) => return reject_hardened(e),
    };
    match rewrite_json_body(request, limit, sanitize::strip_operator_keys).await {
        Ok(request) => next.run(request).await,
        Err(e) => reject_hardened(e),
    }
}

// =============================================================================
// Security headers
// =============================================================================

/// Security headers middleware.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    apply_security_headers(response.headers_mut());
    response
}

/// Set [`SECURITY_HEADERS`], keeping any Content-Security-Policy already present.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    headers
        .entry(header::CONTENT_SECURITY_POLICY)
        .or_insert(HeaderValue::from_static(DEFAULT_CSP));

    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers.remove("x-powered-by");
}

// =============================================================================
// XSS filter
// =============================================================================

/// Escape markup in JSON body strings and query values.
pub async fn xss_filter(State(limit): State<BodyLimit>, request: Request, next: Next) -> Response {
    let request = match rewrite_query(request, sanitize::escape_query) {
        Ok(r) => r,
        Err(e) => return reject(e),
    };
    match rewrite_json_body(request, limit, sanitize::escape_json_strings).await {
        Ok(request) => next.run(request).await,
        Err(e) => reject(e),
    }
}

// =============================================================================
// JSON body
// =============================================================================

/// Enforce the body limit and reject malformed JSON before routing.
pub async fn json_body(State(limit): State<BodyLimit>, request: Request, next: Next) -> Response {
    if !is_json(request.headers()) {
        return next.run(request).await;
    }

    let (parts, bytes) = match read_body(request, limit).await {
        Ok(read) => read,
        Err(e) => return reject(e),
    };

    if !bytes.is_empty() {
        if let Err(e) = serde_json::from_slice::<Value>(&bytes) {
            return reject(ApiError::bad_request(format!("Malformed JSON body: {}", e)));
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// =============================================================================
// CORS
// =============================================================================

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        // Wildcard origin - no credentials allowed, can use Any
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any)
            .allow_origin(Any)
            .max_age(std::time::Duration::from_secs(600))
    } else {
        // tower-http panics if credentials are combined with wildcard headers
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::ORIGIN,
            ])
            .expose_headers([
                header::CONTENT_LENGTH,
                header::CONTENT_TYPE,
                header::CONTENT_DISPOSITION,
            ])
            .allow_credentials(true)
            .allow_origin(origins)
            .max_age(std::time::Duration::from_secs(600))
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Request logging middleware.
///
/// Tags the request with an `X-Request-ID` (reusing the client's if given)
/// and logs one line when the response is ready.
pub async fn request_logging(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    let status = response.status();
    let duration = start.elapsed();
    let length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    if uri.path() != "/health" && uri.path() != "/ready" {
        info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            duration_ms = %duration.as_millis(),
            length = %length,
            "{} {} {} {:.1} ms - {}",
            method,
            uri.path(),
            status.as_u16(),
            duration.as_secs_f64() * 1000.0,
            length
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// Request id assigned by [`request_logging`], available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

// =============================================================================
// Helpers
// =============================================================================

/// Rejections from these stages never reach the error handler, so log here.
fn reject(err: ApiError) -> Response {
    warn!("Request rejected before routing: {}", err);
    err.into_response()
}

/// [`reject`] for stages outside [`security_headers`].
fn reject_hardened(err: ApiError) -> Response {
    let mut response = reject(err);
    apply_security_headers(response.headers_mut());
    response
}

/// True for `application/json` and `application/*+json` content types.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false)
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

async fn read_body(
    request: Request,
    limit: BodyLimit,
) -> Result<(axum::http::request::Parts, Bytes), ApiError> {
    if declared_length(request.headers()).is_some_and(|len| len > limit.0) {
        return Err(ApiError::PayloadTooLarge(limit.0));
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit.0)
        .await
        .map_err(|_| ApiError::PayloadTooLarge(limit.0))?;
    Ok((parts, bytes))
}

/// Apply `rewrite` to a JSON request body in place.
///
/// Bodies that are not JSON, are declared larger than the limit, or fail
/// to parse are passed through unchanged for [`json_body`] to judge. A body
/// with no declared length has to be buffered to find out, so overflowing
/// it is an error here.
async fn rewrite_json_body<F>(request: Request, limit: BodyLimit, rewrite: F) -> Result<Request, ApiError>
where
    F: FnOnce(&mut Value) -> usize,
{
    if !is_json(request.headers())
        || declared_length(request.headers()).is_some_and(|len| len > limit.0)
    {
        return Ok(request);
    }

    let (mut parts, bytes) = read_body(request, limit).await?;

    let mut value = match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => value,
        Err(_) => return Ok(Request::from_parts(parts, Body::from(bytes))),
    };

    if rewrite(&mut value) == 0 {
        return Ok(Request::from_parts(parts, Body::from(bytes)));
    }

    let rewritten = serde_json::to_vec(&value).map_err(|e| ApiError::internal(e.to_string()))?;
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));
    Ok(Request::from_parts(parts, Body::from(rewritten)))
}

/// Apply `rewrite` to the query string, if any.
fn rewrite_query<F>(mut request: Request, rewrite: F) -> Result<Request, ApiError>
where
    F: FnOnce(&str) -> Option<String>,
{
    let Some(new_query) = request.uri().query().and_then(rewrite) else {
        return Ok(request);
    };

    let path = request.uri().path();
    let path_and_query = if new_query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, new_query)
    };

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query)
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))?,
    );
    *request.uri_mut() = Uri::from_parts(parts)
        .map_err(|e| ApiError::bad_request(format!("Invalid request URI: {}", e)))?;

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(&json_headers()));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/merge-patch+json"),
        );
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
        assert!(!is_json(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn test_rewrite_json_body_updates_length() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"<b>x</b>"}"#))
            .unwrap();

        let request = rewrite_json_body(request, BodyLimit(1024), sanitize::escape_json_strings)
            .await
            .unwrap();

        let length = declared_length(request.headers()).unwrap();
        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(length, bytes.len());
        assert_eq!(&bytes[..], br#"{"name":"&lt;b&gt;x&lt;/b&gt;"}"#);
    }

    #[tokio::test]
    async fn test_rewrite_json_body_passes_malformed_through() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\":"))
            .unwrap();

        let request = rewrite_json_body(request, BodyLimit(1024), sanitize::strip_operator_keys)
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"{\"name\":");
    }

    #[test]
    fn test_apply_security_headers_keeps_existing_csp() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static("default-src 'none'"));
        headers.insert("x-powered-by", HeaderValue::from_static("Express"));

        apply_security_headers(&mut headers);

        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], "default-src 'none'");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert!(headers.get("x-powered-by").is_none());
    }

    #[tokio::test]
    async fn test_unsized_oversized_body_is_rejected_with_headers() {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"blob":"{}"}}"#, "a".repeat(4096))))
            .unwrap();

        let err = rewrite_json_body(request, BodyLimit(1024), sanitize::strip_operator_keys)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge(1024)));

        let response = reject_hardened(err);
        assert_eq!(response.status(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
    }

    #[test]
    fn test_rewrite_query_drops_empty_query() {
        let request = Request::builder()
            .uri("/api/v1/job?%24where=1")
            .body(Body::empty())
            .unwrap();

        let request = rewrite_query(request, sanitize::strip_query_operators).unwrap();
        assert_eq!(request.uri().to_string(), "/api/v1/job");
    }
}
