use crate::AppState;
use crate::api::error::AppError;
use crate::models::{
    AssetResponse, DeleteAssetRequest, ListAssetsQuery, PresignFileRequest, PresignedGrant,
    UpdateAssetRequest,
};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

#[utoipa::path(
    put,
    path = "/api/assets",
    request_body = Vec<PresignFileRequest>,
    responses(
        (status = 200, description = "One grant per file, in request order", body = Vec<PresignedGrant>),
        (status = 400, description = "Invalid batch"),
        (status = 409, description = "A key is already in use"),
        (status = 502, description = "Storage provider failed"),
        (status = 503, description = "Object storage is not configured")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "assets"
)]
pub async fn presign_assets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(files): Json<Vec<PresignFileRequest>>,
) -> Result<Json<Vec<PresignedGrant>>, AppError> {
    let grants = state.assets.presign_batch(&claims.sub, files).await?;
    Ok(Json(grants))
}

#[utoipa::path(
    delete,
    path = "/api/assets",
    request_body = DeleteAssetRequest,
    responses(
        (status = 204, description = "Object and record deleted"),
        (status = 404, description = "Asset not found"),
        (status = 502, description = "Storage provider failed")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "assets"
)]
pub async fn delete_asset(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DeleteAssetRequest>,
) -> Result<StatusCode, AppError> {
    req.validate()?;
    state.assets.delete_asset(&claims.sub, &req.key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/library",
    params(
        ("search" = Option<String>, Query, description = "Substring of the asset name"),
        ("status" = Option<String>, Query, description = "pending or confirmed"),
        ("limit" = Option<u64>, Query, description = "Page size (default 50, max 200)"),
        ("offset" = Option<u64>, Query, description = "Rows to skip")
    ),
    responses(
        (status = 200, description = "Assets of the current user", body = Vec<AssetResponse>)
    ),
    security(
        ("jwt" = [])
    ),
    tag = "assets"
)]
pub async fn list_assets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListAssetsQuery>,
) -> Result<Json<Vec<AssetResponse>>, AppError> {
    let assets = state.assets.list_assets(&claims.sub, &query).await?;
    Ok(Json(assets.into_iter().map(AssetResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset metadata", body = AssetResponse),
        (status = 404, description = "Asset not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "assets"
)]
pub async fn get_asset(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.assets.get_asset(&claims.sub, &id).await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    patch,
    path = "/api/assets/{id}",
    params(("id" = String, Path, description = "Asset ID")),
    request_body = UpdateAssetRequest,
    responses(
        (status = 200, description = "Updated asset", body = AssetResponse),
        (status = 404, description = "Asset not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "assets"
)]
pub async fn update_asset(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAssetRequest>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.assets.update_asset(&claims.sub, &id, req).await?;
    Ok(Json(asset.into()))
}

#[utoipa::path(
    post,
    path = "/api/assets/{id}/confirm",
    params(("id" = String, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset confirmed", body = AssetResponse),
        (status = 404, description = "Asset not found"),
        (status = 409, description = "Object has not been uploaded yet")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "assets"
)]
pub async fn confirm_asset(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<AssetResponse>, AppError> {
    let asset = state.assets.confirm_asset(&claims.sub, &id).await?;
    Ok(Json(asset.into()))
}
