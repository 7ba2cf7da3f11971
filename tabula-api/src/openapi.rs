//! OpenAPI Specification for the Tabula API
//!
//! Generated by utoipa from the route annotations and schema derives.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{base, cell, column, health, row, table, view};
use crate::types::*;

use tabula_core::{
    Base, BaseId, BaseTheme, Cell, CellId, Column, ColumnId, ColumnType, EntityType, Row, RowId,
    Table, TableId, View, ViewId,
};

/// OpenAPI document for the Tabula API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tabula API",
        version = "0.1.0",
        description = "Bases, tables, typed columns, rows, cells and saved views",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Bases", description = "Top-level workspaces owned by a user"),
        (name = "Tables", description = "Tables and paged table data"),
        (name = "Rows", description = "Row creation and deletion"),
        (name = "Columns", description = "Typed columns"),
        (name = "Cells", description = "Cell value edits"),
        (name = "Views", description = "Saved sorting, filtering and column visibility"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        // === Base Routes ===
        base::list_bases,
        base::create_base,
        base::get_base,
        base::update_base,
        base::delete_base,
        base::create_table,

        // === Table Routes ===
        table::get_table_data,
        table::add_row,
        table::add_bulk_rows,
        table::add_column,
        table::create_view,

        // === Entity Routes ===
        row::delete_row,
        column::rename_column,
        cell::edit_cell,
        view::update_view,
        view::delete_view,

        // === Health Routes ===
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            // Errors
            ApiError,
            ErrorCode,

            // Identifiers
            BaseId,
            TableId,
            ColumnId,
            RowId,
            CellId,
            ViewId,

            // Domain entities
            Base,
            BaseTheme,
            Table,
            Column,
            ColumnType,
            Row,
            Cell,
            View,
            EntityType,

            // Requests and responses
            CreateBaseRequest,
            UpdateBaseRequest,
            BaseSummary,
            ListBasesResponse,
            BaseResponse,
            CreateTableRequest,
            TableDataResponse,
            RowData,
            AddBulkRowsRequest,
            AddBulkRowsResponse,
            AddColumnRequest,
            ColumnCreatedResponse,
            RenameColumnRequest,
            EditCellRequest,
            CreateViewRequest,
            UpdateViewRequest,
            DeleteResponse,

            // Health
            HealthResponse,
            HealthStatus,
            HealthDetails,
            ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Declares the `x-user-id` header as the API's security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-user-id"))),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Tabula API");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert_eq!(tags.len(), 7);

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("user_id"));
        assert!(components.schemas.contains_key("BaseId"));
        assert!(components.schemas.contains_key("TableDataResponse"));
        Ok(())
    }

    #[test]
    fn test_openapi_paths_cover_routes() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        let value: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| format!("Generated JSON invalid: {}", e))?;
        let paths = value["paths"]
            .as_object()
            .ok_or_else(|| "paths missing".to_string())?;
        for path in [
            "/api/v1/bases",
            "/api/v1/bases/{id}",
            "/api/v1/bases/{id}/tables",
            "/api/v1/tables/{id}/data",
            "/api/v1/tables/{id}/rows/bulk",
            "/api/v1/cells/{id}",
            "/api/v1/views/{id}",
        ] {
            assert!(paths.contains_key(path), "missing path {}", path);
        }
        Ok(())
    }

    fn schemas() -> Result<serde_json::Value, String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        let value: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| format!("Generated JSON invalid: {}", e))?;
        Ok(value["components"]["schemas"].clone())
    }

    #[test]
    fn test_id_schemas_are_uuid_strings() -> Result<(), String> {
        let schemas = schemas()?;
        for id in ["BaseId", "TableId", "ColumnId", "RowId", "CellId", "ViewId"] {
            assert_eq!(schemas[id]["type"], "string", "{} type", id);
            assert_eq!(schemas[id]["format"], "uuid", "{} format", id);
        }
        Ok(())
    }

    #[test]
    fn test_timestamps_are_date_time_strings() -> Result<(), String> {
        let schemas = schemas()?;
        for (schema, field) in [
            ("BaseResponse", "created_at"),
            ("BaseResponse", "updated_at"),
            ("Base", "created_at"),
            ("Table", "created_at"),
            ("View", "updated_at"),
        ] {
            let property = &schemas[schema]["properties"][field];
            assert_eq!(property["type"], "string", "{}.{} type", schema, field);
            assert_eq!(property["format"], "date-time", "{}.{} format", schema, field);
        }
        Ok(())
    }

    #[test]
    fn test_health_schemas_back_health_paths() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        let value: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| format!("Generated JSON invalid: {}", e))?;
        for path in ["/health/ping", "/health/live", "/health/ready"] {
            assert!(value["paths"].get(path).is_some(), "missing path {}", path);
        }
        for schema in ["HealthResponse", "HealthStatus", "HealthDetails", "ComponentHealth"] {
            assert!(value["components"]["schemas"].get(schema).is_some(), "missing {}", schema);
        }
        Ok(())
    }
}
