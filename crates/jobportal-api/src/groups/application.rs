//! Built-in application route group.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use super::{GroupStatus, RouteGroup};
use crate::state::AppState;

/// Job applications.
pub struct ApplicationRoutes;

#[derive(OpenApi)]
#[openapi(
    paths(index),
    components(schemas(GroupStatus)),
    tags((name = "application", description = "Job applications"))
)]
struct ApplicationApi;

#[utoipa::path(
    get,
    path = "/",
    tag = "application",
    responses((status = 200, description = "Application routes are mounted", body = GroupStatus))
)]
async fn index() -> Json<GroupStatus> {
    Json(GroupStatus::ok("application"))
}

impl RouteGroup for ApplicationRoutes {
    fn name(&self) -> &'static str {
        "application"
    }

    fn register(&self, router: Router<AppState>) -> Router<AppState> {
        router.route("/", get(index))
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        ApplicationApi::openapi()
    }
}
