use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::auth::middleware::optional_auth_user;
use crate::dto::{
    AuthTokens, GuestLoginRequest, LoginRequest, RefreshResponse, RefreshTokenRequest,
    RegisterRequest,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

/// The body is optional: an empty one starts a fresh guest.
pub async fn guest_login(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<AuthTokens>> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        GuestLoginRequest::default()
    } else {
        serde_json::from_slice::<GuestLoginRequest>(&body)
            .map_err(|e| AppError::Validation(format!("無効なリクエストデータです: {}", e)))?
    };

    let tokens = state.users.guest_login(req.id).await?;
    Ok(Json(tokens))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RefreshTokenRequest>, AppError>,
) -> AppResult<Json<RefreshResponse>> {
    body.validate()?;
    let response = state.users.refresh(&body.refresh_token).await?;
    Ok(Json(response))
}

/// A valid guest bearer token turns the registration into a promotion.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<Json<AuthTokens>> {
    body.validate()?;
    let caller = optional_auth_user(&headers, &state.config)?;

    let tokens = state.users.register(body, caller).await?;
    Ok(Json(tokens))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<AuthTokens>> {
    body.validate()?;
    let tokens = state.users.login(body).await?;
    Ok(Json(tokens))
}
