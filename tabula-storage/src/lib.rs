//! Tabula Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the persistence boundary for Tabula entities. Views cross this
//! boundary as [`ViewRecord`]s whose configuration parts are opaque JSON
//! text; decoding back into a typed [`ViewConfig`] is lenient.

mod memory;
mod store;

pub use memory::InMemoryStore;
pub use store::{TableCounts, TableStore};

use serde::{Deserialize, Serialize};
use tabula_core::{
    BaseTheme, DecodedViewConfig, PersistedViewConfig, TableId, Timestamp, View, ViewConfig,
    ViewId,
};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for bases.
#[derive(Debug, Clone, Default)]
pub struct BaseUpdate {
    /// New display name
    pub name: Option<String>,
    /// New color theme
    pub theme: Option<BaseTheme>,
}

/// Update payload for views. Configuration parts are replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct ViewUpdate {
    pub name: Option<String>,
    pub config: Option<PersistedViewConfig>,
}

// ============================================================================
// VIEW RECORD
// ============================================================================

/// A view as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub view_id: ViewId,
    pub table_id: TableId,
    pub name: String,
    pub sorting: Option<String>,
    pub filters: Option<String>,
    pub column_visibility: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ViewRecord {
    /// Encode a typed view for storage.
    pub fn from_view(view: &View) -> Result<Self, serde_json::Error> {
        let persisted = view.config.to_persisted()?;
        Ok(Self {
            view_id: view.view_id,
            table_id: view.table_id,
            name: view.name.clone(),
            sorting: persisted.sorting,
            filters: persisted.filters,
            column_visibility: persisted.column_visibility,
            created_at: view.created_at,
            updated_at: view.updated_at,
        })
    }

    pub fn persisted_config(&self) -> PersistedViewConfig {
        PersistedViewConfig {
            sorting: self.sorting.clone(),
            filters: self.filters.clone(),
            column_visibility: self.column_visibility.clone(),
        }
    }

    fn apply_config(&mut self, config: PersistedViewConfig) {
        self.sorting = config.sorting;
        self.filters = config.filters;
        self.column_visibility = config.column_visibility;
    }

    /// Decode into a typed view. Parts that fail to decode come back empty
    /// and are listed alongside the view.
    pub fn decode(&self) -> (View, DecodedViewConfig) {
        let decoded = self.persisted_config().decode();
        let view = View {
            view_id: self.view_id,
            table_id: self.table_id,
            name: self.name.clone(),
            config: decoded.config.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (view, decoded)
    }

    /// Decode into a typed view, discarding the defaulting report.
    pub fn to_view(&self) -> View {
        self.decode().0
    }

    /// Typed configuration only.
    pub fn config(&self) -> ViewConfig {
        self.persisted_config().decode().config
    }
}
