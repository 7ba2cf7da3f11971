//! Error types for Tabula operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors raised before any mutation is applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Errors raised by edits to a view configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewConfigError {
    #[error("Column {column} is already in the sort list")]
    DuplicateSortColumn { column: String },

    #[error("Sort index {index} out of range (len {len})")]
    SortIndexOutOfRange { index: usize, len: usize },

    #[error("Filter index {index} out of range (len {len})")]
    FilterIndexOutOfRange { index: usize, len: usize },

    #[error("Column {column} does not belong to this table")]
    UnknownColumn { column: String },
}

/// Access errors: the actor may not touch the resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("No actor identity supplied")]
    MissingActor,

    #[error("Actor {actor} does not own {entity_type:?} {id}")]
    NotOwner {
        actor: String,
        entity_type: EntityType,
        id: Uuid,
    },
}

/// Master error type for all Tabula errors.
#[derive(Debug, Clone, Error)]
pub enum TabulaError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("View config error: {0}")]
    ViewConfig(#[from] ViewConfigError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),
}

impl TabulaError {
    /// Shorthand for a storage `NotFound` error.
    pub fn not_found(entity_type: EntityType, id: impl Into<Uuid>) -> Self {
        TabulaError::Storage(StorageError::NotFound {
            entity_type,
            id: id.into(),
        })
    }

    /// Whether this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TabulaError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for Tabula operations.
pub type TabulaResult<T> = Result<T, TabulaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Table,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Table"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_view_config_error_display_duplicate() {
        let err = ViewConfigError::DuplicateSortColumn {
            column: "abc".to_string(),
        };
        assert!(format!("{}", err).contains("already in the sort list"));
    }

    #[test]
    fn test_access_error_display_not_owner() {
        let err = AccessError::NotOwner {
            actor: "user-1".to_string(),
            entity_type: EntityType::Base,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("user-1"));
        assert!(msg.contains("Base"));
    }

    #[test]
    fn test_tabula_error_from_variants() {
        let storage = TabulaError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, TabulaError::Storage(_)));

        let validation = TabulaError::from(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        });
        assert!(matches!(validation, TabulaError::Validation(_)));

        let view = TabulaError::from(ViewConfigError::SortIndexOutOfRange { index: 3, len: 1 });
        assert!(matches!(view, TabulaError::ViewConfig(_)));

        let access = TabulaError::from(AccessError::MissingActor);
        assert!(matches!(access, TabulaError::Access(_)));
    }

    #[test]
    fn test_not_found_shorthand() {
        let err = TabulaError::not_found(EntityType::Row, Uuid::nil());
        assert!(err.is_not_found());
        assert!(!TabulaError::from(StorageError::LockPoisoned).is_not_found());
    }
}
