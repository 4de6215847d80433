use crate::AppState;
use crate::api::error::AppError;
use crate::models::{CreateTaxonomyRequest, TaxonomyEntry};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/tags",
    responses((status = 200, description = "All tags", body = Vec<TaxonomyEntry>)),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TaxonomyEntry>>, AppError> {
    Ok(Json(state.taxonomy.list_tags().await?))
}

#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTaxonomyRequest,
    responses(
        (status = 201, description = "Tag created", body = TaxonomyEntry),
        (status = 409, description = "Tag already exists")
    ),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn create_tag(
    State(state): State<AppState>,
    Json(req): Json<CreateTaxonomyRequest>,
) -> Result<(StatusCode, Json<TaxonomyEntry>), AppError> {
    let tag = state.taxonomy.create_tag(req).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(("id" = String, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found")
    ),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.taxonomy.delete_tag(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories", body = Vec<TaxonomyEntry>)),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaxonomyEntry>>, AppError> {
    Ok(Json(state.taxonomy.list_categories().await?))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateTaxonomyRequest,
    responses(
        (status = 201, description = "Category created", body = TaxonomyEntry),
        (status = 409, description = "Category already exists")
    ),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateTaxonomyRequest>,
) -> Result<(StatusCode, Json<TaxonomyEntry>), AppError> {
    let category = state.taxonomy.create_category(req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category and its subcategories deleted"),
        (status = 404, description = "Category not found")
    ),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.taxonomy.delete_category(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}/subcategories",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Subcategories of the category", body = Vec<TaxonomyEntry>),
        (status = 404, description = "Category not found")
    ),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Result<Json<Vec<TaxonomyEntry>>, AppError> {
    Ok(Json(state.taxonomy.list_subcategories(&category_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/categories/{id}/subcategories",
    params(("id" = String, Path, description = "Category ID")),
    request_body = CreateTaxonomyRequest,
    responses(
        (status = 201, description = "Subcategory created", body = TaxonomyEntry),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Subcategory already exists")
    ),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn create_subcategory(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Json(req): Json<CreateTaxonomyRequest>,
) -> Result<(StatusCode, Json<TaxonomyEntry>), AppError> {
    let subcategory = state
        .taxonomy
        .create_subcategory(&category_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(subcategory)))
}

#[utoipa::path(
    delete,
    path = "/api/subcategories/{id}",
    params(("id" = String, Path, description = "Subcategory ID")),
    responses(
        (status = 204, description = "Subcategory deleted"),
        (status = 404, description = "Subcategory not found")
    ),
    security(("jwt" = [])),
    tag = "taxonomy"
)]
pub async fn delete_subcategory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.taxonomy.delete_subcategory(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
