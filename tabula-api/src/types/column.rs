//! Column-related API types

use serde::{Deserialize, Serialize};
use tabula_core::{Cell, Column, ColumnType};

/// Request to add a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct AddColumnRequest {
    pub name: String,
    #[serde(default)]
    pub column_type: ColumnType,
}

/// A newly created column and the empty cell seeded into every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct ColumnCreatedResponse {
    pub column: Column,
    pub cells: Vec<Cell>,
}

/// Request to rename a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct RenameColumnRequest {
    pub name: String,
}
