//! API Request and Response Types
//!
//! Request and response bodies of the REST API. The client crate decodes
//! the same types.

// Base types
mod base;
pub use base::*;

// Table types
mod table;
pub use table::*;

// Row types
mod row;
pub use row::*;

// Column types
mod column;
pub use column::*;

// Cell types
mod cell;
pub use cell::*;

// View types
mod view;
pub use view::*;

use serde::{Deserialize, Serialize};

/// Outcome of a delete operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}
