//! Axum API server binary.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jobportal_api::{bootstrap, ApiConfig, RouteGroups};

const DEFAULT_LOG_FILTER: &str = "jobportal_api=info,jobportal_db=info";

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env();
    init_tracing(config.log_json);

    info!("Starting jobportal-api");

    if let Err(e) = bootstrap::run(config, RouteGroups::default()).await {
        error!("jobportal-api stopped: {:#}", e);
        std::process::exit(1);
    }
}

/// Coloured text for development, JSON when `LOG_FORMAT=json`.
fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
