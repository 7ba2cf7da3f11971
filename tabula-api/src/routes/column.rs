//! Column REST API Routes

use axum::{
    extract::{Path, State},
    Json,
};
use tabula_core::{Column, ColumnId};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::AppState,
    types::RenameColumnRequest,
};

/// PATCH /api/v1/columns/{id} - Rename a column
#[utoipa::path(
    patch,
    path = "/api/v1/columns/{id}",
    tag = "Columns",
    params(
        ("id" = ColumnId, Path, description = "Column ID")
    ),
    request_body = RenameColumnRequest,
    responses(
        (status = 200, description = "Column renamed", body = Column),
        (status = 400, description = "Missing name", body = ApiError),
        (status = 403, description = "Column owned by another user", body = ApiError),
        (status = 404, description = "Column not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn rename_column(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<ColumnId>,
    Json(req): Json<RenameColumnRequest>,
) -> ApiResult<Json<Column>> {
    let column = db.column_rename(&auth.user_id, id, &req).await?;
    Ok(Json(column))
}

/// Create the column router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/:id", axum::routing::patch(rename_column))
}
