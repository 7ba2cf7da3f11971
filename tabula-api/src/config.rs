//! API Configuration Module
//!
//! Server configuration loaded from environment variables with defaults
//! suitable for development.

use crate::error::{ApiError, ApiResult};
use std::net::SocketAddr;

pub const DEFAULT_MAX_BULK_ROWS: usize = 100_000;
pub const DEFAULT_PAGE_SIZE: usize = 500;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 5_000;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Upper bound on `rowCount` for bulk row creation.
    pub max_bulk_rows: usize,

    /// Rows per page when a request names no limit.
    pub default_page_size: usize,

    /// Largest page a request may ask for.
    pub max_page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            max_bulk_rows: DEFAULT_MAX_BULK_ROWS,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TABULA_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` or `TABULA_API_PORT`: Listen port (default: 3000)
    /// - `TABULA_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `TABULA_MAX_BULK_ROWS`: Bulk row ceiling (default: 100000)
    /// - `TABULA_DEFAULT_PAGE_SIZE`: Default rows per page (default: 500)
    /// - `TABULA_MAX_PAGE_SIZE`: Maximum rows per page (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("TABULA_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        Self {
            bind_host: std::env::var("TABULA_API_BIND").unwrap_or(defaults.bind_host),
            port: env_parse("PORT")
                .or_else(|| env_parse("TABULA_API_PORT"))
                .unwrap_or(defaults.port),
            cors_origins,
            max_bulk_rows: env_parse("TABULA_MAX_BULK_ROWS").unwrap_or(defaults.max_bulk_rows),
            default_page_size: env_parse("TABULA_DEFAULT_PAGE_SIZE")
                .unwrap_or(defaults.default_page_size),
            max_page_size: env_parse("TABULA_MAX_PAGE_SIZE").unwrap_or(defaults.max_page_size),
        }
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> ApiResult<()> {
        if self.max_bulk_rows == 0 {
            return Err(ApiError::invalid_input("TABULA_MAX_BULK_ROWS must be at least 1"));
        }
        if self.max_page_size == 0 {
            return Err(ApiError::invalid_input("TABULA_MAX_PAGE_SIZE must be at least 1"));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ApiError::invalid_range(
                "TABULA_DEFAULT_PAGE_SIZE",
                1,
                self.max_page_size,
            ));
        }
        Ok(())
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.max_bulk_rows, 100_000);
        assert_eq!(config.default_page_size, 500);
        assert_eq!(config.max_page_size, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_default_above_max() {
        let config = ApiConfig {
            default_page_size: 10,
            max_page_size: 5,
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.test , ,https://b.test"),
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
    }

    #[test]
    fn test_origin_allowed() {
        let mut config = ApiConfig::default();
        assert!(config.is_origin_allowed("http://localhost:5173"));
        config.cors_origins = vec!["https://tabula.test".to_string()];
        assert!(config.is_origin_allowed("https://tabula.test"));
        assert!(!config.is_origin_allowed("https://evil.test"));
    }

    #[test]
    fn test_bind_addr() -> ApiResult<()> {
        let config = ApiConfig {
            bind_host: "127.0.0.1".to_string(),
            port: 8080,
            ..ApiConfig::default()
        };
        assert_eq!(config.bind_addr()?.port(), 8080);
        Ok(())
    }
}
