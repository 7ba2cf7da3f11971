//! Base REST API Routes
//!
//! Listing, creation, inspection, update and deletion of bases, plus table
//! creation inside a base. Every handler runs on behalf of the request
//! actor and only touches bases that actor owns.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tabula_core::BaseId;

use crate::{
    db::DbClient,
    error::{ApiError, ApiResult},
    middleware::AuthExtractor,
    state::AppState,
    types::{
        BaseResponse, CreateBaseRequest, CreateTableRequest, DeleteResponse, ListBasesResponse,
        TableDataResponse, UpdateBaseRequest,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/bases - List the actor's bases, most recently updated first
#[utoipa::path(
    get,
    path = "/api/v1/bases",
    tag = "Bases",
    responses(
        (status = 200, description = "Bases owned by the actor", body = ListBasesResponse),
        (status = 401, description = "Missing actor", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn list_bases(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<Json<ListBasesResponse>> {
    let bases = db.base_list_for_user(&auth.user_id).await?;
    Ok(Json(bases))
}

/// POST /api/v1/bases - Create a base with one seeded table
#[utoipa::path(
    post,
    path = "/api/v1/bases",
    tag = "Bases",
    request_body = CreateBaseRequest,
    responses(
        (status = 201, description = "Base created", body = BaseResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Missing actor", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn create_base(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<CreateBaseRequest>,
) -> ApiResult<impl IntoResponse> {
    let base = db.base_create(&auth.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(base)))
}

/// GET /api/v1/bases/{id} - Get a base and its tables
#[utoipa::path(
    get,
    path = "/api/v1/bases/{id}",
    tag = "Bases",
    params(
        ("id" = BaseId, Path, description = "Base ID")
    ),
    responses(
        (status = 200, description = "Base details", body = BaseResponse),
        (status = 403, description = "Base owned by another user", body = ApiError),
        (status = 404, description = "Base not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn get_base(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<BaseId>,
) -> ApiResult<Json<BaseResponse>> {
    let base = db.base_get(&auth.user_id, id).await?;
    Ok(Json(base))
}

/// PATCH /api/v1/bases/{id} - Rename a base or change its theme
#[utoipa::path(
    patch,
    path = "/api/v1/bases/{id}",
    tag = "Bases",
    params(
        ("id" = BaseId, Path, description = "Base ID")
    ),
    request_body = UpdateBaseRequest,
    responses(
        (status = 200, description = "Base updated", body = BaseResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 403, description = "Base owned by another user", body = ApiError),
        (status = 404, description = "Base not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn update_base(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<BaseId>,
    Json(req): Json<UpdateBaseRequest>,
) -> ApiResult<Json<BaseResponse>> {
    let base = db.base_update(&auth.user_id, id, &req).await?;
    Ok(Json(base))
}

/// DELETE /api/v1/bases/{id} - Delete a base and everything in it
#[utoipa::path(
    delete,
    path = "/api/v1/bases/{id}",
    tag = "Bases",
    params(
        ("id" = BaseId, Path, description = "Base ID")
    ),
    responses(
        (status = 200, description = "Base deleted", body = DeleteResponse),
        (status = 403, description = "Base owned by another user", body = ApiError),
        (status = 404, description = "Base not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn delete_base(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<BaseId>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = db.base_delete(&auth.user_id, id).await?;
    Ok(Json(deleted))
}

/// POST /api/v1/bases/{id}/tables - Create a seeded table in a base
#[utoipa::path(
    post,
    path = "/api/v1/bases/{id}/tables",
    tag = "Tables",
    params(
        ("id" = BaseId, Path, description = "Base ID")
    ),
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created", body = TableDataResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 403, description = "Base owned by another user", body = ApiError),
        (status = 404, description = "Base not found", body = ApiError),
    ),
    security(("user_id" = []))
)]
pub async fn create_table(
    State(db): State<DbClient>,
    AuthExtractor(auth): AuthExtractor,
    Path(id): Path<BaseId>,
    Json(req): Json<CreateTableRequest>,
) -> ApiResult<impl IntoResponse> {
    let table = db.table_create(&auth.user_id, id, &req).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the base router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::get(list_bases).post(create_base))
        .route(
            "/:id",
            axum::routing::get(get_base)
                .patch(update_base)
                .delete(delete_base),
        )
        .route("/:id/tables", axum::routing::post(create_table))
}
