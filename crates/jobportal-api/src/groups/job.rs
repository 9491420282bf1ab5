//! Built-in job route group.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use super::{GroupStatus, RouteGroup};
use crate::state::AppState;

/// Job postings.
pub struct JobRoutes;

#[derive(OpenApi)]
#[openapi(
    paths(index),
    components(schemas(GroupStatus)),
    tags((name = "job", description = "Job postings"))
)]
struct JobApi;

#[utoipa::path(
    get,
    path = "/",
    tag = "job",
    responses((status = 200, description = "Job routes are mounted", body = GroupStatus))
)]
async fn index() -> Json<GroupStatus> {
    Json(GroupStatus::ok("job"))
}

impl RouteGroup for JobRoutes {
    fn name(&self) -> &'static str {
        "job"
    }

    fn register(&self, router: Router<AppState>) -> Router<AppState> {
        router.route("/", get(index))
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        JobApi::openapi()
    }
}
