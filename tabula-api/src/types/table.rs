//! Table-related API types

use serde::{Deserialize, Serialize};
use tabula_core::{Column, Table, View};

use super::RowData;

/// Request to create a table. Without a name the table is called "Table N".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct CreateTableRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Pagination parameters for table data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDataParams {
    /// Last row position already seen.
    #[serde(default)]
    pub cursor: Option<u64>,
    /// Rows to return, clamped to the server maximum.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One page of a table: its columns, a page of rows with their cells, and
/// its views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct TableDataResponse {
    pub table: Table,
    pub columns: Vec<Column>,
    pub rows: Vec<RowData>,
    pub views: Vec<View>,
    /// Cursor for the next page; absent on the last page.
    pub next_cursor: Option<u64>,
}
