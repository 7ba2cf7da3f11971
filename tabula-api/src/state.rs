//! Shared application state for Axum routers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::{DataLimits, DbClient};

/// Application-wide state shared across all routes.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DbClient,
    pub config: Arc<ApiConfig>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(db: DbClient, config: ApiConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }

    /// State over a fresh in-memory store, limits taken from `config`.
    pub fn in_memory(config: ApiConfig) -> Self {
        let db = DbClient::in_memory(DataLimits::from(&config));
        Self::new(db, config)
    }
}

crate::impl_from_ref!(DbClient, db);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(std::time::Instant, start_time);
