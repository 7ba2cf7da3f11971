//! Cell-related API types

use serde::{Deserialize, Serialize};

/// Request to overwrite a cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct EditCellRequest {
    pub value: String,
}
