//! Built-in auth route group.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use super::{GroupStatus, RouteGroup};
use crate::state::AppState;

/// Registration and login.
pub struct AuthRoutes;

#[derive(OpenApi)]
#[openapi(
    paths(index),
    components(schemas(GroupStatus)),
    tags((name = "auth", description = "Registration and login"))
)]
struct AuthApi;

#[utoipa::path(
    get,
    path = "/",
    tag = "auth",
    responses((status = 200, description = "Auth routes are mounted", body = GroupStatus))
)]
async fn index() -> Json<GroupStatus> {
    Json(GroupStatus::ok("auth"))
}

impl RouteGroup for AuthRoutes {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn register(&self, router: Router<AppState>) -> Router<AppState> {
        router.route("/", get(index))
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        AuthApi::openapi()
    }
}
