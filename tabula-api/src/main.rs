//! Tabula API Server Entry Point
//!
//! Bootstraps configuration and tracing, then starts the Axum HTTP server
//! over an in-memory store.

use axum::Router;
use tabula_api::telemetry::{init_tracing, TelemetryConfig};
use tabula_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    api_config.validate()?;
    let addr = api_config.bind_addr()?;

    let state = AppState::in_memory(api_config);
    let app: Router = create_api_router(state);

    tracing::info!(%addr, "Starting Tabula API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
