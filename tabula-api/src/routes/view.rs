//! View REST API Routes
//!
//! View creation lives on the table router; this module updates and
//! deletes existing views.

use axum::{
    extract::{Path, State},
    Json,
};
use tabula_core::{View, ViewId};

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::AppState,
    types::{DeleteResponse, UpdateViewRequest},
};

/// PATCH /api/v1/views/{id} - Rename a view or replace its config
#[utoipa::path(
    patch,
    path = "/api/v1/views/{id}",
    tag = "Views",
    params(
        ("id" = ViewId, Path, description = "View ID")
    ),
    request_body = UpdateViewRequest,
    responses(
        (status = 200, description = "View updated", body = View),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 403, description = "View owned by another user", body = ApiError),
        (status = 404, description = "View not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn update_view(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<ViewId>,
    Json(req): Json<UpdateViewRequest>,
) -> ApiResult<Json<View>> {
    let view = db.view_update(&auth.user_id, id, &req).await?;
    Ok(Json(view))
}

/// DELETE /api/v1/views/{id} - Delete a view
#[utoipa::path(
    delete,
    path = "/api/v1/views/{id}",
    tag = "Views",
    params(
        ("id" = ViewId, Path, description = "View ID")
    ),
    responses(
        (status = 200, description = "View deleted", body = DeleteResponse),
        (status = 400, description = "Last view of a table", body = ApiError),
        (status = 403, description = "View owned by another user", body = ApiError),
        (status = 404, description = "View not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn delete_view(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<ViewId>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = db.view_delete(&auth.user_id, id).await?;
    Ok(Json(deleted))
}

/// Create the view router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/:id",
        axum::routing::patch(update_view).delete(delete_view),
    )
}
