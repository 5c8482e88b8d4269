use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;

use crate::auth::middleware::AuthUser;
use crate::dto::{
    CreateDiaryRequest, DataResponse, DiaryRangeQuery, MessageResponse, UpdateDiaryRequest,
};
use crate::error::{AppError, AppResult};
use crate::models::diary::{parse_date, Diary, DiaryChanges, NewDiary};
use crate::models::mental::MentalScore;
use crate::AppState;

pub const DIARY_DELETED: &str = "日記が正常に削除されました";

pub async fn list_diaries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<DataResponse<Vec<Diary>>>> {
    let diaries = state.diaries.list(auth_user.id).await?;
    Ok(Json(DataResponse::new(diaries)))
}

pub async fn list_diaries_in_range(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<DiaryRangeQuery>, AppError>,
) -> AppResult<Json<DataResponse<Vec<Diary>>>> {
    let (Some(start), Some(end)) = (query.start_date, query.end_date) else {
        return Err(AppError::Validation(
            "start_date と end_date を指定してください".into(),
        ));
    };

    let diaries = state
        .diaries
        .range(auth_user.id, parse_date(&start)?, parse_date(&end)?)
        .await?;
    Ok(Json(DataResponse::new(diaries)))
}

pub async fn get_diary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> AppResult<Json<DataResponse<Diary>>> {
    let diary = state.diaries.get(auth_user.id, parse_date(&date)?).await?;
    Ok(Json(DataResponse::new(diary)))
}

pub async fn create_diary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<CreateDiaryRequest>, AppError>,
) -> AppResult<(StatusCode, Json<DataResponse<Diary>>)> {
    let new_diary = NewDiary {
        user_id: auth_user.id,
        date: parse_date(&body.date)?,
        mental: MentalScore::new(body.mental)?,
        diary: body.diary,
    };

    let diary = state.diaries.create(new_diary).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(diary))))
}

pub async fn update_diary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateDiaryRequest>, AppError>,
) -> AppResult<Json<DataResponse<Diary>>> {
    let date = parse_date(&date)?;
    let changes = DiaryChanges {
        mental: MentalScore::new(body.mental)?,
        diary: body.diary,
    };

    let diary = state.diaries.update(auth_user.id, date, changes).await?;
    Ok(Json(DataResponse::new(diary)))
}

pub async fn delete_diary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.diaries.delete(auth_user.id, parse_date(&date)?).await?;
    Ok(Json(MessageResponse::new(DIARY_DELETED)))
}
