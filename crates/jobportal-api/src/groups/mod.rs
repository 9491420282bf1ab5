//! Route groups.
//!
//! A route group owns one path namespace. The bootstrap only knows the
//! [`RouteGroup`] capability: it hands each group an empty router, nests the
//! result under the group's prefix and merges the group's OpenAPI paths
//! into the generated documentation.

use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

pub mod application;
pub mod auth;
pub mod job;
pub mod user;

pub use application::ApplicationRoutes;
pub use auth::AuthRoutes;
pub use job::JobRoutes;
pub use user::UserRoutes;

pub const USER_PREFIX: &str = "/api/v1/user";
pub const AUTH_PREFIX: &str = "/api/v1/auth";
pub const JOB_PREFIX: &str = "/api/v1/job";
pub const APPLICATION_PREFIX: &str = "/api/v1/application";

/// Registers handlers on a router.
pub trait RouteGroup: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Add this group's routes to `router`. Paths are relative to the
    /// group's prefix.
    fn register(&self, router: Router<AppState>) -> Router<AppState>;

    /// Documented paths, relative to the group's prefix.
    fn openapi(&self) -> utoipa::openapi::OpenApi {
        utoipa::openapi::OpenApi::default()
    }
}

/// The four route groups mounted by the bootstrap.
#[derive(Clone)]
pub struct RouteGroups {
    pub user: Arc<dyn RouteGroup>,
    pub auth: Arc<dyn RouteGroup>,
    pub job: Arc<dyn RouteGroup>,
    pub application: Arc<dyn RouteGroup>,
}

impl RouteGroups {
    /// `(prefix, group)` pairs in mount order.
    pub fn mounts(&self) -> [(&'static str, &Arc<dyn RouteGroup>); 4] {
        [
            (USER_PREFIX, &self.user),
            (AUTH_PREFIX, &self.auth),
            (JOB_PREFIX, &self.job),
            (APPLICATION_PREFIX, &self.application),
        ]
    }
}

impl Default for RouteGroups {
    fn default() -> Self {
        Self {
            user: Arc::new(UserRoutes),
            auth: Arc::new(AuthRoutes),
            job: Arc::new(JobRoutes),
            application: Arc::new(ApplicationRoutes),
        }
    }
}

/// Body returned by a built-in group's index route.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupStatus {
    pub group: String,
    pub status: String,
}

impl GroupStatus {
    pub fn ok(group: &str) -> Self {
        Self {
            group: group.to_string(),
            status: "ok".to_string(),
        }
    }
}
