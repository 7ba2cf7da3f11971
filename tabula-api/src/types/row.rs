//! Row-related API types

use serde::{Deserialize, Serialize};
use tabula_core::{Cell, Row, RowId};

/// A row with its cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct RowData {
    pub row_id: RowId,
    pub position: u64,
    pub cells: Vec<Cell>,
}

impl RowData {
    pub fn new(row: &Row, cells: Vec<Cell>) -> Self {
        Self {
            row_id: row.row_id,
            position: row.position,
            cells,
        }
    }
}

/// Request to append many empty rows in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct AddBulkRowsRequest {
    pub row_count: usize,
}

/// Rows created by a bulk request, in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct AddBulkRowsResponse {
    pub rows: Vec<RowData>,
}
