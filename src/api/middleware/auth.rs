use crate::utils::auth::validate_jwt;
use crate::{AppState, entities::prelude::Users};
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use sea_orm::EntityTrait;

/// Resolves `Authorization: Bearer <jwt>` into [`Claims`](crate::utils::auth::Claims)
/// stored in the request extensions. Tokens of deleted users are rejected.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = validate_jwt(token, &state.config.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    let user_exists = Users::find_by_id(claims.sub.clone())
        .one(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Auth lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .is_some();

    if !user_exists {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
