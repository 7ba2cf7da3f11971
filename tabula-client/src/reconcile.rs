//! Temporary-to-real identifier remapping.

use std::collections::HashMap;

use tabula_core::{ColumnId, RowId, ViewId};

use crate::keys::{Key, TempId};
use crate::projection::{ColumnKey, LocalViewConfig, RowKey, ViewKey};

/// Record of every temporary identifier the server has replaced.
///
/// Entries are never removed: a caller may still hold a temporary key after
/// its entity was confirmed, and resolving it must keep working.
#[derive(Debug, Clone, Default)]
pub struct IdRemap {
    rows: HashMap<TempId, RowId>,
    columns: HashMap<TempId, ColumnId>,
    views: HashMap<TempId, ViewId>,
}

impl IdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_row(&mut self, temp: TempId, id: RowId) {
        self.rows.insert(temp, id);
    }

    pub fn record_column(&mut self, temp: TempId, id: ColumnId) {
        self.columns.insert(temp, id);
    }

    pub fn record_view(&mut self, temp: TempId, id: ViewId) {
        self.views.insert(temp, id);
    }

    pub fn len(&self) -> usize {
        self.rows.len() + self.columns.len() + self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, key: RowKey) -> RowKey {
        resolve(&self.rows, key)
    }

    pub fn column(&self, key: ColumnKey) -> ColumnKey {
        resolve(&self.columns, key)
    }

    pub fn view(&self, key: ViewKey) -> ViewKey {
        resolve(&self.views, key)
    }

    /// Rewrite every confirmed column reference in a view configuration.
    pub fn config(&self, config: LocalViewConfig) -> LocalViewConfig {
        config.map_columns(|column| self.column(column))
    }
}

fn resolve<I: Copy>(map: &HashMap<TempId, I>, key: Key<I>) -> Key<I> {
    match key {
        Key::Temp(temp) => map.get(&temp).map_or(key, |id| Key::Real(*id)),
        real => real,
    }
}
