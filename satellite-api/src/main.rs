//! Satellite Server Entry Point
//!
//! Loads configuration, applies the optional bootstrap file and starts the
//! Axum HTTP server.

use satellite_api::bootstrap;
use satellite_api::telemetry::{init_tracing, TelemetryConfig};
use satellite_api::{create_router, ApiError, ApiResult, AppState, ServerConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let config = ServerConfig::from_env();
    let addr = config.bind_addr()?;
    tracing::debug!(config = ?config, "configuration loaded");
    if !config.admin_enabled() {
        tracing::warn!("SATELLITE_ADMIN_KEYS is empty; admin RPC is disabled");
    }

    let bootstrap_path = config.bootstrap_path.clone();
    let state = AppState::new(config);

    if let Some(path) = bootstrap_path {
        let document = bootstrap::load_file(&path).await?;
        let summary = bootstrap::apply(&state, document).await?;
        tracing::info!(path = %path.display(), ?summary, "bootstrap file loaded");
    }

    let app = create_router(state);

    tracing::info!(%addr, "Starting Satellite server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
