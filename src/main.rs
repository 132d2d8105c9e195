//! filmqa server binary.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filmqa::config::{self, LogFormat};
use filmqa::{api, AppState, Error, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::init();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "filmqa=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        "Starting filmqa server on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::debug!(
        templates_dir = %config.export.templates_dir.display(),
        database = %config.database.path,
        "Configuration loaded"
    );

    // Initialize application state
    let state = AppState::new().await?;
    tracing::info!("Application state initialized");

    // Initialize startup time for uptime tracking
    api::status::init_startup_time();

    // Start keep-alive ticker
    if api::status::start_keep_alive(config.server.keep_alive_interval_secs).is_some() {
        tracing::debug!(
            interval_secs = config.server.keep_alive_interval_secs,
            "Keep-alive ticker started"
        );
    }

    // Build router
    let app = filmqa::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid listen address: {}", e)))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
