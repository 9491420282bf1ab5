//! API configuration.

use std::path::PathBuf;

use jobportal_db::DbConfig;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default JSON body limit (100 KiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024;

/// API server configuration.
///
/// Loaded once at startup and passed explicitly to the bootstrap; nothing
/// downstream reads the process environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Mode label shown at startup; `production` hides internal error details
    pub dev_mode: String,
    /// Directory served under `/uploads`
    pub uploads_dir: PathBuf,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max JSON request body size
    pub max_body_size: usize,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
    /// Emit JSON log lines instead of coloured text
    pub log_json: bool,
    /// API documentation descriptor
    pub docs: DocsConfig,
    /// Database connector settings
    pub database: DbConfig,
}

/// API documentation descriptor.
#[derive(Debug, Clone)]
pub struct DocsConfig {
    pub title: String,
    pub description: String,
    pub servers: Vec<DocsServer>,
}

/// A base URL listed in the API documentation.
#[derive(Debug, Clone)]
pub struct DocsServer {
    pub url: String,
    pub description: String,
}

impl DocsConfig {
    fn for_server(url: String) -> Self {
        Self {
            title: "Job Portal Application".to_string(),
            description: "Rust Axum Job Portal Application".to_string(),
            servers: vec![DocsServer {
                url,
                description: "Local Development".to_string(),
            }],
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self::for_server(format!("http://localhost:{}", DEFAULT_PORT))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            dev_mode: "development".to_string(),
            uploads_dir: PathBuf::from("uploads"),
            cors_origins: vec!["*".to_string()],
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            metrics_enabled: true,
            log_json: false,
            docs: DocsConfig::default(),
            database: DbConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let docs_url =
            lookup("DOCS_SERVER_URL").unwrap_or_else(|| format!("http://localhost:{}", port));

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            dev_mode: lookup("DEV_MODE").unwrap_or_else(|| "development".to_string()),
            uploads_dir: lookup("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| vec!["*".to_string()]),
            max_body_size: lookup("MAX_BODY_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),
            metrics_enabled: lookup("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            log_json: lookup("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
            docs: DocsConfig::for_server(docs_url),
            database: DbConfig::from_lookup(&lookup),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.dev_mode.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_port_defaults_to_8080() {
        let config = ApiConfig::from_lookup(|_| None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.docs.servers[0].url, "http://localhost:8080");
        assert_eq!(config.docs.title, "Job Portal Application");
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = ApiConfig::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9090"),
            ("DEV_MODE", "production"),
            ("UPLOADS_DIR", "/var/lib/jobportal/uploads"),
            ("CORS_ORIGINS", "https://jobs.example.com, https://admin.example.com"),
            ("DATABASE_URL", "postgres://jobs@db/jobs"),
        ]);
        let config = ApiConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.port, 9090);
        assert!(config.is_production());
        assert_eq!(config.uploads_dir, PathBuf::from("/var/lib/jobportal/uploads"));
        assert_eq!(
            config.cors_origins,
            vec!["https://jobs.example.com", "https://admin.example.com"]
        );
        assert_eq!(config.docs.servers[0].url, "http://localhost:9090");
        assert_eq!(config.database.url, "postgres://jobs@db/jobs");
    }

    #[test]
    fn test_dev_mode_is_not_production() {
        assert!(!ApiConfig::default().is_production());
    }
}
