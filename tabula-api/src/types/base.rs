//! Base-related API types

use serde::{Deserialize, Serialize};
use tabula_core::{Base, BaseId, BaseTheme, Table, TableId, Timestamp, UserId};

/// Request to create a base. Omitted fields fall back to "Untitled Base"
/// and the blue theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct CreateBaseRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub theme: Option<BaseTheme>,
}

/// Request to update a base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct UpdateBaseRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub theme: Option<BaseTheme>,
}

impl UpdateBaseRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.theme.is_none()
    }
}

/// One entry of the base listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct BaseSummary {
    pub base_id: BaseId,
    pub name: String,
    pub theme: BaseTheme,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: Timestamp,
    pub first_table_id: Option<TableId>,
}

/// Response for listing bases, most recently updated first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct ListBasesResponse {
    pub bases: Vec<BaseSummary>,
}

/// A base together with its tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct BaseResponse {
    pub base_id: BaseId,
    pub owner_id: UserId,
    pub name: String,
    pub theme: BaseTheme,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Timestamp,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: Timestamp,
    pub tables: Vec<Table>,
}

impl BaseResponse {
    pub fn new(base: Base, tables: Vec<Table>) -> Self {
        Self {
            base_id: base.base_id,
            owner_id: base.owner_id,
            name: base.name,
            theme: base.theme,
            created_at: base.created_at,
            updated_at: base.updated_at,
            tables,
        }
    }
}
