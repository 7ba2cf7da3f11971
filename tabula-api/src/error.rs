//! Error Types for Tabula API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabula_core::{AccessError, EntityType, StorageError, TabulaError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Access Errors (401, 403)
    // ========================================================================
    /// Request carries no actor identity
    Unauthorized,

    /// Actor does not own the resource
    Forbidden,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field value is out of valid range
    InvalidRange,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    BaseNotFound,
    TableNotFound,
    ColumnNotFound,
    RowNotFound,
    CellNotFound,
    ViewNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Entity with the same identifier already exists
    EntityAlreadyExists,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Storage operation failed
    DatabaseError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            ErrorCode::EntityNotFound
            | ErrorCode::BaseNotFound
            | ErrorCode::TableNotFound
            | ErrorCode::ColumnNotFound
            | ErrorCode::RowNotFound
            | ErrorCode::CellNotFound
            | ErrorCode::ViewNotFound => StatusCode::NOT_FOUND,

            ErrorCode::EntityAlreadyExists => StatusCode::CONFLICT,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Actor identity required",
            ErrorCode::Forbidden => "Access forbidden",

            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidRange => "Value is out of valid range",
            ErrorCode::InvalidFormat => "Invalid format",

            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::BaseNotFound => "Base not found",
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::ColumnNotFound => "Column not found",
            ErrorCode::RowNotFound => "Row not found",
            ErrorCode::CellNotFound => "Cell not found",
            ErrorCode::ViewNotFound => "View not found",

            ErrorCode::EntityAlreadyExists => "Entity already exists",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Storage operation failed",
        }
    }

    /// Whether this code reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == StatusCode::NOT_FOUND
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
///
/// This type is returned by all API endpoints when an error occurs, and is
/// what clients decode from non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    /// Create the not-found error matching an entity type.
    pub fn entity_not_found(entity_type: EntityType, id: impl fmt::Display) -> Self {
        let code = match entity_type {
            EntityType::Base => ErrorCode::BaseNotFound,
            EntityType::Table => ErrorCode::TableNotFound,
            EntityType::Column => ErrorCode::ColumnNotFound,
            EntityType::Row => ErrorCode::RowNotFound,
            EntityType::Cell => ErrorCode::CellNotFound,
            EntityType::View => ErrorCode::ViewNotFound,
        };
        Self::new(code, format!("{} {} not found", entity_type, id))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Implement IntoResponse for ApiError so handlers can return it directly.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<TabulaError> for ApiError {
    fn from(err: TabulaError) -> Self {
        match err {
            TabulaError::Storage(StorageError::NotFound { entity_type, id }) => {
                ApiError::entity_not_found(entity_type, id)
            }
            TabulaError::Storage(StorageError::InsertFailed { entity_type, reason })
                if reason == "already exists" =>
            {
                ApiError::new(
                    ErrorCode::EntityAlreadyExists,
                    format!("{} already exists", entity_type),
                )
            }
            TabulaError::Storage(err) => {
                tracing::error!(error = %err, "Storage error");
                ApiError::database_error(err.to_string())
            }
            TabulaError::Validation(err) => ApiError::validation_failed(err.to_string()),
            TabulaError::ViewConfig(err) => ApiError::validation_failed(err.to_string()),
            TabulaError::Access(AccessError::MissingActor) => {
                ApiError::from_code(ErrorCode::Unauthorized)
            }
            TabulaError::Access(err) => ApiError::forbidden(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::invalid_format("id", &format!("valid UUID: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{ValidationError, ViewConfigError};
    use uuid::Uuid;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::TableNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::EntityAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_code_wire_format() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&ErrorCode::BaseNotFound)?, "\"BASE_NOT_FOUND\"");
        for unknown in ["\"STATE_CONFLICT\"", "\"SERVICE_UNAVAILABLE\""] {
            assert!(serde_json::from_str::<ErrorCode>(unknown).is_err());
        }
        Ok(())
    }

    #[test]
    fn test_not_found_maps_to_entity_code() {
        let err = ApiError::from(TabulaError::not_found(EntityType::Row, Uuid::nil()));
        assert_eq!(err.code, ErrorCode::RowNotFound);
        assert!(err.code.is_not_found());
    }

    #[test]
    fn test_domain_validation_maps_to_bad_request() {
        let err = ApiError::from(TabulaError::from(ValidationError::InvalidValue {
            field: "value".to_string(),
            reason: "'Alice' is not a number".to_string(),
        }));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(TabulaError::from(ViewConfigError::DuplicateSortColumn {
            column: "c".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_access_errors_split_401_and_403() {
        let missing = ApiError::from(TabulaError::from(AccessError::MissingActor));
        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);

        let not_owner = ApiError::from(TabulaError::from(AccessError::NotOwner {
            actor: "mallory".to_string(),
            entity_type: EntityType::Base,
            id: Uuid::nil(),
        }));
        assert_eq!(not_owner.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_api_error_serialization() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(ApiError::from_code(ErrorCode::Forbidden))?;
        assert_eq!(json, serde_json::json!({"code": "FORBIDDEN", "message": "Access forbidden"}));
        Ok(())
    }
}
