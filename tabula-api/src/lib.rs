//! Tabula API - REST API Layer
//!
//! Exposes bases, tables, columns, rows, cells and views over an Axum REST
//! API. Handlers delegate to [`DbClient`], which implements each operation
//! over a [`tabula_storage::TableStore`].

pub mod config;
pub mod db;
pub mod error;
pub mod macros;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::ApiConfig;
pub use db::{DataLimits, DbClient};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{AuthContext, AuthExtractor, USER_ID_HEADER};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
