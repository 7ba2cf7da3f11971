//! Core entity structures

use crate::{
    BaseId, BaseTheme, CellId, ColumnId, ColumnType, EntityIdType, RowId, TableId, Timestamp,
    UserId, ViewConfig, ViewId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Base - top-level container analogous to a database or workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Base {
    pub base_id: BaseId,
    pub owner_id: UserId,
    pub name: String,
    pub theme: BaseTheme,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Base {
    pub fn new(owner_id: impl Into<UserId>, name: impl Into<String>, theme: BaseTheme) -> Self {
        let now = Utc::now();
        Self {
            base_id: BaseId::now_v7(),
            owner_id: owner_id.into(),
            name: name.into(),
            theme,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Table - a named grid of typed columns and rows within a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Table {
    pub table_id: TableId,
    pub base_id: BaseId,
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Table {
    pub fn new(base_id: BaseId, name: impl Into<String>) -> Self {
        Self {
            table_id: TableId::now_v7(),
            base_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Column - a typed field of a table. Columns are ordered by `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Column {
    pub column_id: ColumnId,
    pub table_id: TableId,
    pub name: String,
    pub column_type: ColumnType,
    pub position: u32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Column {
    pub fn new(
        table_id: TableId,
        name: impl Into<String>,
        column_type: ColumnType,
        position: u32,
    ) -> Self {
        Self {
            column_id: ColumnId::now_v7(),
            table_id,
            name: name.into(),
            column_type,
            position,
            created_at: Utc::now(),
        }
    }
}

/// Row - a record of a table. Rows are ordered by `position`, which also
/// serves as the pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Row {
    pub row_id: RowId,
    pub table_id: TableId,
    pub position: u64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Row {
    pub fn new(table_id: TableId, position: u64) -> Self {
        Self {
            row_id: RowId::now_v7(),
            table_id,
            position,
            created_at: Utc::now(),
        }
    }
}

/// Cell - the value at a (row, column) intersection.
/// A row has at most one cell per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Cell {
    pub cell_id: CellId,
    pub row_id: RowId,
    pub column_id: ColumnId,
    pub value: String,
}

impl Cell {
    /// A new empty cell.
    pub fn empty(row_id: RowId, column_id: ColumnId) -> Self {
        Self {
            cell_id: CellId::now_v7(),
            row_id,
            column_id,
            value: String::new(),
        }
    }
}

/// View - a saved sort/filter/visibility configuration over a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct View {
    pub view_id: ViewId,
    pub table_id: TableId,
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub config: ViewConfig,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl View {
    pub fn new(table_id: TableId, name: impl Into<String>, config: ViewConfig) -> Self {
        let now = Utc::now();
        Self {
            view_id: ViewId::now_v7(),
            table_id,
            name: name.into(),
            config,
            created_at: now,
            updated_at: now,
        }
    }
}
