use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::diary::{Diary, DiaryChanges, NewDiary};
use crate::repositories::DiaryRepository;

#[derive(Clone)]
pub struct DiaryUsecase {
    repo: Arc<dyn DiaryRepository>,
}

impl DiaryUsecase {
    pub fn new(repo: Arc<dyn DiaryRepository>) -> Self {
        Self { repo }
    }

    pub async fn all(&self) -> AppResult<Vec<Diary>> {
        Ok(self.repo.find_all().await?)
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Diary>> {
        Ok(self.repo.find_by_user(user_id).await?)
    }

    pub async fn get(&self, user_id: Uuid, date: NaiveDate) -> AppResult<Diary> {
        Ok(self.repo.find_by_user_and_date(user_id, date).await?)
    }

    pub async fn range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Diary>> {
        if start > end {
            return Err(AppError::Validation(
                "start_date は end_date 以前の日付を指定してください".into(),
            ));
        }
        Ok(self
            .repo
            .find_by_user_and_date_range(user_id, start, end)
            .await?)
    }

    pub async fn create(&self, diary: NewDiary) -> AppResult<Diary> {
        let created = self.repo.create(diary).await?;
        tracing::debug!(user_id = %created.user_id, date = %created.date, "Diary created");
        Ok(created)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        changes: DiaryChanges,
    ) -> AppResult<Diary> {
        Ok(self.repo.update(user_id, date, changes).await?)
    }

    pub async fn delete(&self, user_id: Uuid, date: NaiveDate) -> AppResult<()> {
        self.repo.delete(user_id, date).await?;
        tracing::debug!(user_id = %user_id, date = %date, "Diary deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrated_sqlite;
    use crate::models::mental::MentalScore;
    use crate::repositories::{DIARY_ALREADY_EXISTS, DIARY_NOT_FOUND};

    async fn usecase() -> DiaryUsecase {
        DiaryUsecase::new(migrated_sqlite().await.diary_repository())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn entry(user_id: Uuid, d: u32, mental: i32) -> NewDiary {
        NewDiary {
            user_id,
            date: day(d),
            mental: MentalScore::new(mental).unwrap(),
            diary: format!("day {}", d),
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_is_conflict() {
        let diaries = usecase().await;
        let user_id = Uuid::new_v4();

        diaries.create(entry(user_id, 1, 5)).await.unwrap();
        let err = diaries.create(entry(user_id, 1, 7)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == DIARY_ALREADY_EXISTS));
    }

    #[tokio::test]
    async fn test_missing_update_is_not_found() {
        let diaries = usecase().await;
        let changes = DiaryChanges {
            mental: MentalScore::new(5).unwrap(),
            diary: "x".into(),
        };
        let missing = NaiveDate::from_ymd_opt(2099, 1, 1).unwrap();

        let err = diaries
            .update(Uuid::new_v4(), missing, changes)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == DIARY_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let diaries = usecase().await;
        let err = diaries
            .range(Uuid::new_v4(), day(10), day(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_single_day_range() {
        let diaries = usecase().await;
        let user_id = Uuid::new_v4();
        diaries.create(entry(user_id, 3, 4)).await.unwrap();
        diaries.create(entry(user_id, 4, 4)).await.unwrap();

        let found = diaries.range(user_id, day(3), day(3)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date, day(3));
    }

    #[tokio::test]
    async fn test_list_is_per_user_and_all_spans_users() {
        let diaries = usecase().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        diaries.create(entry(alice, 2, 5)).await.unwrap();
        diaries.create(entry(alice, 1, 5)).await.unwrap();
        diaries.create(entry(bob, 1, 5)).await.unwrap();

        let mine = diaries.list(alice).await.unwrap();
        assert_eq!(mine.iter().map(|d| d.date).collect::<Vec<_>>(), vec![day(1), day(2)]);
        assert_eq!(diaries.all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let diaries = usecase().await;
        let user_id = Uuid::new_v4();
        diaries.create(entry(user_id, 5, 5)).await.unwrap();

        diaries.delete(user_id, day(5)).await.unwrap();
        assert!(matches!(
            diaries.get(user_id, day(5)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
