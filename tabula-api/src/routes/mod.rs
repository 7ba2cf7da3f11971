//! REST API Routes Module
//!
//! Route handlers organized by entity type, plus health checks and the
//! OpenAPI document.

pub mod base;
pub mod cell;
pub mod column;
pub mod health;
pub mod row;
pub mod table;
pub mod view;

use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::middleware::USER_ID_HEADER;
use crate::openapi::ApiDoc;
use crate::state::AppState;

const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Build the CORS layer from configuration.
///
/// No configured origins means development mode: every origin is allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(CORS_MAX_AGE);

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins).allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
        ])
    }
}

/// Create the complete API router.
///
/// - Entity routes under /api/v1/* (actor required)
/// - Health checks at /health/*
/// - OpenAPI spec at /openapi.json
pub fn create_api_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/bases", base::create_router())
        .nest("/tables", table::create_router())
        .nest("/rows", row::create_router())
        .nest("/columns", column::create_router())
        .nest("/cells", cell::create_router())
        .nest("/views", view::create_router());

    let cors = build_cors_layer(&state.config);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router())
        .route("/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
