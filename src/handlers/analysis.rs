use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::dto::AnalysisResponse;
use crate::error::AppResult;
use crate::AppState;

pub async fn analyze_diaries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<AnalysisResponse>> {
    let analysis_result = state.analysis.analyze_user_diaries(auth_user.id).await?;
    Ok(Json(AnalysisResponse { analysis_result }))
}
