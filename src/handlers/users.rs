use axum::{extract::State, Extension, Json};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{MessageResponse, UpdateProfileRequest};
use crate::error::{AppError, AppResult};
use crate::models::user::UserProfile;
use crate::AppState;

pub const WITHDRAWN: &str = "ユーザーと日記データを全て削除しました";

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let profile = state.users.profile(auth_user.id).await?;
    Ok(Json(profile))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfileRequest>, AppError>,
) -> AppResult<Json<UserProfile>> {
    body.validate()?;
    let profile = state
        .users
        .update_nickname(auth_user.id, &body.nickname)
        .await?;
    Ok(Json(profile))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<MessageResponse>> {
    state.users.withdraw(auth_user.id).await?;
    Ok(Json(MessageResponse::new(WITHDRAWN)))
}
