use crate::AppState;
use crate::api::error::AppError;
use crate::entities::users;
use crate::services::user_service::ProfileChanges;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserProfileResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    /// An empty string clears the address.
    #[validate(length(max = 254))]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 256, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub is_admin: bool,
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Profile of the caller", body = UserProfileResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserProfileResponse>, AppError> {
    let user = state.users.get(&claims.sub).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserProfileResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfileResponse>, AppError> {
    payload.validate()?;
    if let Some(email) = payload.email.as_deref().map(str::trim)
        && !email.is_empty()
        && !validator::ValidateEmail::validate_email(&email)
    {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    let user = state
        .users
        .update_profile(
            &claims.sub,
            ProfileChanges {
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All accounts", body = Vec<UserProfileResponse>),
        (status = 403, description = "Caller is not an administrator")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserProfileResponse>>, AppError> {
    state.users.require_admin(&claims.sub).await?;
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserProfileResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserProfileResponse),
        (status = 400, description = "Administrators cannot revoke their own role"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn update_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<UserProfileResponse>, AppError> {
    state.users.require_admin(&claims.sub).await?;
    let user = state
        .users
        .set_admin(&claims.sub, &id, payload.is_admin)
        .await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Administrators cannot delete their own account"),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still owns assets or posts")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.users.require_admin(&claims.sub).await?;
    state.users.delete(&claims.sub, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
