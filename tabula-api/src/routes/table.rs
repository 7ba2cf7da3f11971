//! Table REST API Routes
//!
//! Paged table data plus the operations that add rows, columns and views
//! to a table.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tabula_core::{TableId, View};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::AppState,
    types::{
        AddBulkRowsRequest, AddBulkRowsResponse, AddColumnRequest, ColumnCreatedResponse,
        CreateViewRequest, RowData, TableDataParams, TableDataResponse,
    },
};

/// GET /api/v1/tables/{id}/data - One page of rows with columns and views
#[utoipa::path(
    get,
    path = "/api/v1/tables/{id}/data",
    tag = "Tables",
    params(
        ("id" = TableId, Path, description = "Table ID"),
        ("cursor" = Option<u64>, Query, description = "Position of the last row already fetched"),
        ("limit" = Option<usize>, Query, description = "Rows per page"),
    ),
    responses(
        (status = 200, description = "Table data page", body = TableDataResponse),
        (status = 403, description = "Table owned by another user", body = ApiError),
        (status = 404, description = "Table not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn get_table_data(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<TableId>,
    Query(params): Query<TableDataParams>,
) -> ApiResult<Json<TableDataResponse>> {
    let data = db.table_data(&auth.user_id, id, params).await?;
    Ok(Json(data))
}

/// POST /api/v1/tables/{id}/rows - Append one empty row
#[utoipa::path(
    post,
    path = "/api/v1/tables/{id}/rows",
    tag = "Rows",
    params(
        ("id" = TableId, Path, description = "Table ID")
    ),
    responses(
        (status = 201, description = "Row created", body = RowData),
        (status = 403, description = "Table owned by another user", body = ApiError),
        (status = 404, description = "Table not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn add_row(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<TableId>,
) -> ApiResult<impl IntoResponse> {
    let row = db.row_add(&auth.user_id, id).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/tables/{id}/rows/bulk - Append many empty rows at once
#[utoipa::path(
    post,
    path = "/api/v1/tables/{id}/rows/bulk",
    tag = "Rows",
    params(
        ("id" = TableId, Path, description = "Table ID")
    ),
    request_body = AddBulkRowsRequest,
    responses(
        (status = 201, description = "Rows created", body = AddBulkRowsResponse),
        (status = 400, description = "Row count out of range", body = ApiError),
        (status = 403, description = "Table owned by another user", body = ApiError),
        (status = 404, description = "Table not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn add_bulk_rows(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<TableId>,
    Json(req): Json<AddBulkRowsRequest>,
) -> ApiResult<impl IntoResponse> {
    let rows = db.rows_add_bulk(&auth.user_id, id, &req).await?;
    Ok((StatusCode::CREATED, Json(rows)))
}

/// POST /api/v1/tables/{id}/columns - Append a typed column
#[utoipa::path(
    post,
    path = "/api/v1/tables/{id}/columns",
    tag = "Columns",
    params(
        ("id" = TableId, Path, description = "Table ID")
    ),
    request_body = AddColumnRequest,
    responses(
        (status = 201, description = "Column created with one empty cell per row", body = ColumnCreatedResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 403, description = "Table owned by another user", body = ApiError),
        (status = 404, description = "Table not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn add_column(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<TableId>,
    Json(req): Json<AddColumnRequest>,
) -> ApiResult<impl IntoResponse> {
    let created = db.column_add(&auth.user_id, id, &req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/tables/{id}/views - Create a view
#[utoipa::path(
    post,
    path = "/api/v1/tables/{id}/views",
    tag = "Views",
    params(
        ("id" = TableId, Path, description = "Table ID")
    ),
    request_body = CreateViewRequest,
    responses(
        (status = 201, description = "View created", body = View),
        (status = 400, description = "Config references unknown columns", body = ApiError),
        (status = 403, description = "Table owned by another user", body = ApiError),
        (status = 404, description = "Table not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn create_view(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<TableId>,
    Json(req): Json<CreateViewRequest>,
) -> ApiResult<impl IntoResponse> {
    let view = db.view_create(&auth.user_id, id, &req).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Create the table router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/:id/data", axum::routing::get(get_table_data))
        .route("/:id/rows", axum::routing::post(add_row))
        .route("/:id/rows/bulk", axum::routing::post(add_bulk_rows))
        .route("/:id/columns", axum::routing::post(add_column))
        .route("/:id/views", axum::routing::post(create_view))
}
