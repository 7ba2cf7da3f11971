//! Cell REST API Routes

use axum::{
    extract::{Path, State},
    Json,
};
use tabula_core::{Cell, CellId};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::AppState,
    types::EditCellRequest,
};

/// PATCH /api/v1/cells/{id} - Overwrite a cell value
#[utoipa::path(
    patch,
    path = "/api/v1/cells/{id}",
    tag = "Cells",
    params(
        ("id" = CellId, Path, description = "Cell ID")
    ),
    request_body = EditCellRequest,
    responses(
        (status = 200, description = "Cell updated", body = Cell),
        (status = 400, description = "Value does not fit the column type", body = ApiError),
        (status = 403, description = "Cell owned by another user", body = ApiError),
        (status = 404, description = "Cell not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn edit_cell(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<CellId>,
    Json(req): Json<EditCellRequest>,
) -> ApiResult<Json<Cell>> {
    let cell = db.cell_edit(&auth.user_id, id, &req).await?;
    Ok(Json(cell))
}

/// Create the cell router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/:id", axum::routing::patch(edit_cell))
}
