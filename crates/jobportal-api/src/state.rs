//! Application state.

use std::sync::Arc;

use jobportal_db::Database;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub db: Database,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, db: Database) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}
