//! API routes.

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::docs;
use crate::error::{handle_errors, handle_panic, not_found, ErrorPolicy};
use crate::groups::RouteGroups;
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, json_body, request_logging, sanitize_input, security_headers, xss_filter,
    BodyLimit,
};
use crate::state::AppState;

pub const UPLOADS_PATH: &str = "/uploads";

/// Create the API router.
///
/// Builds the full request pipeline around the route groups; does no I/O.
pub fn create_router(
    state: AppState,
    groups: &RouteGroups,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let config = state.config.clone();
    let limit = BodyLimit(config.max_body_size);
    let policy = ErrorPolicy {
        expose_details: !config.is_production(),
    };

    let mut api_routes = Router::new();
    for (prefix, group) in groups.mounts() {
        debug!(group = group.name(), prefix = prefix, "Mounting route group");
        api_routes = api_routes.nest(prefix, group.register(Router::new()));
    }

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Outermost first. Sanitization and header hardening see the request
    // before anything parses it; the error handler sits directly around
    // the handlers.
    let pipeline = ServiceBuilder::new()
        .layer(from_fn_with_state(limit, sanitize_input))
        .layer(from_fn(security_headers))
        .layer(from_fn_with_state(limit, xss_filter))
        .layer(from_fn_with_state(limit, json_body))
        .layer(cors_layer(&config.cors_origins))
        .layer(from_fn(request_logging))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn_with_state(policy, handle_errors))
        .layer(CatchPanicLayer::custom(handle_panic));

    Router::new()
        .nest_service(UPLOADS_PATH, ServeDir::new(&config.uploads_dir))
        .merge(api_routes)
        .merge(docs::routes(&config.docs, groups))
        .merge(health_routes)
        .merge(metrics_routes)
        .fallback(not_found)
        .layer(pipeline)
        .with_state(state)
}
