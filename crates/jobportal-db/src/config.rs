//! Database connection settings.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Default database URL: an in-process SQLite database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Connection URL (`postgres://...`, `sqlite://...`)
    pub url: String,
    /// Pool upper bound
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// Timeout for establishing a single connection
    pub connect_timeout: Duration,
    /// Log every SQL statement
    pub sql_logging: bool,
    /// Retry policy for the initial connect
    pub retry: RetryConfig,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(8),
            sql_logging: false,
            retry: RetryConfig::default(),
        }
    }
}

impl DbConfig {
    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            url: lookup("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_connections),
            min_connections: lookup("DB_MIN_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_connections),
            connect_timeout: lookup("DB_CONNECT_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            sql_logging: lookup("DB_SQL_LOGGING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.sql_logging),
            retry: RetryConfig::from_lookup(&lookup),
        }
    }
}
