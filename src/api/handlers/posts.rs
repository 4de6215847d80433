use crate::AppState;
use crate::api::error::AppError;
use crate::models::{CreatePostRequest, ListPostsQuery, PostResponse, UpdatePostRequest};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/posts",
    params(
        ("status" = Option<String>, Query, description = "draft or published"),
        ("category_id" = Option<String>, Query, description = "Filter by category"),
        ("limit" = Option<u64>, Query, description = "Page size (default 20, max 100)"),
        ("offset" = Option<u64>, Query, description = "Rows to skip")
    ),
    responses((status = 200, description = "Posts, most recently updated first", body = Vec<PostResponse>)),
    security(("jwt" = [])),
    tag = "posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    Ok(Json(state.posts.list_posts(&query).await?))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid post or unknown taxonomy"),
        (status = 409, description = "Slug already in use")
    ),
    security(("jwt" = [])),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let post = state.posts.create_post(&claims.sub, req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post with tags and SEO metadata", body = PostResponse),
        (status = 404, description = "Post not found")
    ),
    security(("jwt" = [])),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    Ok(Json(state.posts.get_post(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 404, description = "Post not found"),
        (status = 409, description = "Slug already in use")
    ),
    security(("jwt" = [])),
    tag = "posts"
)]
pub async fn update_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    Ok(Json(state.posts.update_post(&claims.sub, &id, req).await?))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Post not found")
    ),
    security(("jwt" = [])),
    tag = "posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.posts.delete_post(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
