//! Row REST API Routes

use axum::{
    extract::{Path, State},
    Json,
};
use tabula_core::RowId;

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::AppState,
    types::DeleteResponse,
};

/// DELETE /api/v1/rows/{id} - Delete a row and its cells
#[utoipa::path(
    delete,
    path = "/api/v1/rows/{id}",
    tag = "Rows",
    params(
        ("id" = RowId, Path, description = "Row ID")
    ),
    responses(
        (status = 200, description = "Row deleted", body = DeleteResponse),
        (status = 403, description = "Row owned by another user", body = ApiError),
        (status = 404, description = "Row not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn delete_row(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<RowId>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = db.row_delete(&auth.user_id, id).await?;
    Ok(Json(deleted))
}

/// Create the row router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/:id", axum::routing::delete(delete_row))
}
