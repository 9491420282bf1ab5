//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "jobportal_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobportal_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobportal_http_requests_in_flight";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    // Prefer the route template so ids do not explode label cardinality
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| normalize_path(request.uri().path()));

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Replace id-like path segments with `:id`.
///
/// Covers numeric ids, UUIDs and 24-character hex object ids.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| if looks_like_id(segment) { ":id" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

fn looks_like_id(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if segment.len() == 24 && segment.chars().all(|c| c.is_ascii_hexdigit()) {
        return true;
    }
    segment.len() == 36
        && segment
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api/v1/job/42"), "/api/v1/job/:id");
        assert_eq!(
            normalize_path("/api/v1/application/65f1c2a9b4e8d3f0a1b2c3d4"),
            "/api/v1/application/:id"
        );
        assert_eq!(
            normalize_path("/api/v1/user/550e8400-e29b-41d4-a716-446655440000/profile"),
            "/api/v1/user/:id/profile"
        );
        assert_eq!(normalize_path("/api/v1/auth/login"), "/api/v1/auth/login");
    }
}
