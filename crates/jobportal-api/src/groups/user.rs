//! Built-in user route group.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use super::{GroupStatus, RouteGroup};
use crate::state::AppState;

/// User profiles.
pub struct UserRoutes;

#[derive(OpenApi)]
#[openapi(
    paths(index),
    components(schemas(GroupStatus)),
    tags((name = "user", description = "User profiles"))
)]
struct UserApi;

#[utoipa::path(
    get,
    path = "/",
    tag = "user",
    responses((status = 200, description = "User routes are mounted", body = GroupStatus))
)]
async fn index() -> Json<GroupStatus> {
    Json(GroupStatus::ok("user"))
}

impl RouteGroup for UserRoutes {
    fn name(&self) -> &'static str {
        "user"
    }

    fn register(&self, router: Router<AppState>) -> Router<AppState> {
        router.route("/", get(index))
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        UserApi::openapi()
    }
}
