use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Caller identity taken from a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub is_guest: bool,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claimed = optional_auth_user(req.headers(), &state.config)?.ok_or(AppError::Unauthorized)?;

    // A signed token outlives its user; withdrawn accounts must not act.
    let auth_user = state.users.resolve(claimed).await?;

    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

/// `Ok(None)` when no Authorization header is sent. A header that is present
/// but not a valid bearer token is rejected.
pub fn optional_auth_user(headers: &HeaderMap, config: &Config) -> AppResult<Option<AuthUser>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_token(token, config)?.claims;
    Ok(Some(AuthUser {
        id: claims.sub,
        is_guest: claims.is_guest,
    }))
}
