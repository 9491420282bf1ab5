//! Generated API documentation.
//!
//! The OpenAPI document is assembled from `#[utoipa::path]` annotations on
//! the bootstrap's own handlers plus every mounted route group, each nested
//! under its prefix. `/api-docs` serves a Swagger UI page that loads it from
//! `/api-docs/openapi.json`.
//!
//! The page is rendered here rather than through `utoipa-swagger-ui`: its
//! `<title>` carries the configured docs title, and the viewer assets come
//! from cdnjs instead of being bundled at build time.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::server::ServerBuilder;
use utoipa::OpenApi;

use crate::config::DocsConfig;
use crate::error::ErrorResponse;
use crate::groups::RouteGroups;
use crate::handlers::health;
use crate::sanitize::escape_markup;

pub const DOCS_PATH: &str = "/api-docs";
pub const SPEC_PATH: &str = "/api-docs/openapi.json";

const SWAGGER_UI_CDN: &str = "https://cdnjs.cloudflare.com/ajax/libs/swagger-ui/4.1.0";

/// Lets the page pull Swagger UI from the CDN; everything else stays same-origin.
const DOCS_CSP: &str = "default-src 'self';script-src 'self' 'unsafe-inline' https://cdnjs.cloudflare.com;\
style-src 'self' 'unsafe-inline' https://cdnjs.cloudflare.com;img-src 'self' data: https:;\
connect-src 'self';object-src 'none';frame-ancestors 'self'";

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>%TITLE%</title>
  <link rel="stylesheet" href="%CDN%/swagger-ui.min.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="%CDN%/swagger-ui-bundle.min.js"></script>
  <script src="%CDN%/swagger-ui-standalone-preset.min.js"></script>
  <script>
    window.onload = function () {
      window.ui = SwaggerUIBundle({
        url: "%SPEC%",
        dom_id: "#swagger-ui",
        deepLinking: true,
        presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
        layout: "StandaloneLayout"
      });
    };
  </script>
</body>
</html>
"##;

#[derive(OpenApi)]
#[openapi(
    paths(health::health, health::ready),
    components(schemas(ErrorResponse)),
    tags((name = "health", description = "Liveness and readiness probes"))
)]
struct BootstrapApi;

/// Build the OpenAPI document for the given descriptor and route groups.
pub fn build_openapi(config: &DocsConfig, groups: &RouteGroups) -> utoipa::openapi::OpenApi {
    let mut openapi = BootstrapApi::openapi();

    for (prefix, group) in groups.mounts() {
        openapi = openapi.nest_with_path_composer(prefix, group.openapi(), mounted_path);
    }

    openapi.info.title = config.title.clone();
    openapi.info.description = Some(config.description.clone());
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.servers = Some(
        config
            .servers
            .iter()
            .map(|s| {
                ServerBuilder::new()
                    .url(s.url.clone())
                    .description(Some(s.description.clone()))
                    .build()
            })
            .collect(),
    );

    openapi
}

/// Path a group route is served at once nested under `prefix`.
///
/// Axum serves a nested `/` at the bare prefix, with no trailing slash.
fn mounted_path(prefix: &str, path: &str) -> String {
    match path {
        "" | "/" => prefix.to_string(),
        _ => format!("{}{}", prefix.trim_end_matches('/'), path),
    }
}

/// Render the Swagger UI page.
pub fn render_page(title: &str) -> String {
    PAGE_TEMPLATE
        .replace("%TITLE%", &escape_markup(title))
        .replace("%CDN%", SWAGGER_UI_CDN)
        .replace("%SPEC%", SPEC_PATH)
}

#[derive(Clone)]
struct Docs {
    page: Arc<str>,
    openapi: Arc<utoipa::openapi::OpenApi>,
}

/// Routes serving the documentation page and document.
pub fn routes<S>(config: &DocsConfig, groups: &RouteGroups) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let docs = Docs {
        page: render_page(&config.title).into(),
        openapi: Arc::new(build_openapi(config, groups)),
    };

    let page = {
        let docs = docs.clone();
        move || async move { page_response(&docs.page) }
    };
    let spec = move || async move { Json(docs.openapi.as_ref().clone()) };

    Router::new()
        .route(DOCS_PATH, get(page.clone()))
        .route(&format!("{}/", DOCS_PATH), get(page))
        .route(SPEC_PATH, get(spec))
}

fn page_response(page: &str) -> Response {
    let mut response = Html(page.to_string()).into_response();
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(DOCS_CSP),
    );
    response
}
