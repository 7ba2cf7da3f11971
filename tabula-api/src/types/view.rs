//! View-related API types

use serde::{Deserialize, Serialize};
use tabula_core::ViewConfig;

/// Request to create a view. Without a config the view shows every column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct CreateViewRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub config: Option<ViewConfig>,
}

/// Request to update a view. The config, when present, replaces the stored
/// sorting, filters and visibility together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct UpdateViewRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub config: Option<ViewConfig>,
}
