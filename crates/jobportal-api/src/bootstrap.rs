//! Process bootstrap: configuration, database, pipeline, listener.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use jobportal_db::Database;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ApiConfig;
use crate::groups::RouteGroups;
use crate::metrics;
use crate::routes::create_router;
use crate::state::AppState;

/// Run the server until a shutdown signal arrives.
///
/// Connects to the database, builds the pipeline around `groups`, binds
/// `config.host:config.port` and serves. The database pool is closed once
/// the server has drained.
pub async fn run(config: ApiConfig, groups: RouteGroups) -> anyhow::Result<()> {
    let db = Database::connect(&config.database)
        .await
        .context("database connection failed")?;

    if !config.uploads_dir.is_dir() {
        warn!(
            dir = %config.uploads_dir.display(),
            "Uploads directory does not exist, /uploads will only return 404"
        );
    }

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("failed to install metrics recorder")?)
    } else {
        None
    };

    let state = AppState::new(config.clone(), db.clone());
    let app = create_router(state, &groups, metrics_handle);

    let listener = bind(&config).await?;
    let port = listener.local_addr()?.port();
    info!("Server running on port {} in {} mode", port, config.dev_mode);

    serve(listener, app).await.context("server error")?;

    db.close().await?;
    info!("Server shutdown complete");
    Ok(())
}

/// Bind the configured address.
pub async fn bind(config: &ApiConfig) -> anyhow::Result<TcpListener> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))
}

/// Serve `app` until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    serve_with_shutdown(listener, app, shutdown_signal()).await
}

/// Serve `app` until `signal` completes, then drain in-flight requests.
pub async fn serve_with_shutdown<F>(listener: TcpListener, app: Router, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(signal)
    .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
