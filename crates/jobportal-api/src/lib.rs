//! Axum HTTP API server for the job portal.
//!
//! This crate provides:
//! - The bootstrap sequence (config, database, pipeline, listener)
//! - Input sanitization, security headers and CORS
//! - Pluggable route groups mounted under `/api/v1`
//! - Generated OpenAPI documentation at `/api-docs`
//! - Centralized error handling and Prometheus metrics

pub mod bootstrap;
pub mod config;
pub mod docs;
pub mod error;
pub mod groups;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod sanitize;
pub mod state;

pub use config::{ApiConfig, DocsConfig, DocsServer};
pub use error::{ApiError, ApiResult};
pub use groups::{RouteGroup, RouteGroups};
pub use routes::create_router;
pub use state::AppState;
