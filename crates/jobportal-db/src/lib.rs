//! Database connector for the job portal API.
//!
//! This crate provides:
//! - Environment-driven connection settings
//! - A pooled sea-orm connection opened with retry and backoff
//! - Liveness pings for readiness probes

pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use client::Database;
pub use config::DbConfig;
pub use error::{DbError, DbResult};
pub use retry::RetryConfig;
