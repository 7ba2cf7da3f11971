//! Error types for the client.

use tabula_core::{EntityType, ValidationError, ViewConfigError};

use crate::api_client::ApiClientError;
use crate::config::ConfigError;
use crate::keys::TempId;
use crate::persistence::PersistenceError;

/// A mutation refused locally, before anything was speculated or sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("{entity_type} {temp} has not been confirmed by the server yet")]
    UnconfirmedReference { entity_type: EntityType, temp: TempId },
    #[error("{entity_type} {key} is not in the projection")]
    UnknownEntity { entity_type: EntityType, key: String },
    #[error("A table must keep at least one view")]
    LastView,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    ViewConfig(#[from] ViewConfigError),
}

impl SyncError {
    pub(crate) fn unknown(entity_type: EntityType, key: impl std::fmt::Display) -> Self {
        Self::UnknownEntity {
            entity_type,
            key: key.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiClientError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
