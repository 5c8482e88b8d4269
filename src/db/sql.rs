//! SQL repository implementations.
//!
//! Both backends accept `$N` placeholders and get timestamps bound from Rust,
//! so the statements below are shared and only the pool type differs.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, SqlitePool};
use uuid::Uuid;

use crate::models::diary::{Diary, DiaryChanges, NewDiary};
use crate::models::user::{Credentials, NewUser, User};
use crate::repositories::{
    classify_write_error, DiaryRepository, RepositoryError, RepositoryResult, UserRepository,
    DIARY_ALREADY_EXISTS, DIARY_NOT_FOUND, EMAIL_ALREADY_REGISTERED, USER_ALREADY_EXISTS,
    USER_NOT_FOUND,
};

const SELECT_ALL_DIARIES: &str = "SELECT * FROM diaries ORDER BY date ASC, user_id ASC";

const SELECT_DIARIES_BY_USER: &str = "SELECT * FROM diaries WHERE user_id = $1 ORDER BY date ASC";

const SELECT_DIARY_BY_USER_AND_DATE: &str =
    "SELECT * FROM diaries WHERE user_id = $1 AND date = $2";

const SELECT_DIARIES_IN_RANGE: &str = r#"
    SELECT * FROM diaries
    WHERE user_id = $1 AND date BETWEEN $2 AND $3
    ORDER BY date ASC
"#;

const INSERT_DIARY: &str = r#"
    INSERT INTO diaries (id, user_id, date, mental, diary, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING *
"#;

const UPDATE_DIARY: &str = r#"
    UPDATE diaries SET mental = $3, diary = $4, updated_at = $5
    WHERE user_id = $1 AND date = $2
    RETURNING *
"#;

const DELETE_DIARY: &str = "DELETE FROM diaries WHERE user_id = $1 AND date = $2";

const DELETE_DIARIES_BY_USER: &str = "DELETE FROM diaries WHERE user_id = $1";

const SELECT_USER_BY_ID: &str = "SELECT * FROM users WHERE id = $1";

const SELECT_USER_BY_EMAIL: &str = "SELECT * FROM users WHERE email = $1";

const SELECT_USER_BY_REFRESH_TOKEN: &str = "SELECT * FROM users WHERE refresh_token_hash = $1";

const SELECT_USER_BY_PROVIDER: &str =
    "SELECT * FROM users WHERE provider = $1 AND provider_id = $2";

const INSERT_USER: &str = r#"
    INSERT INTO users (
        id, nickname, email, password_hash, is_guest, refresh_token_hash,
        provider, provider_id, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    RETURNING *
"#;

const UPDATE_REFRESH_TOKEN: &str =
    "UPDATE users SET refresh_token_hash = $2, updated_at = $3 WHERE id = $1";

const PROMOTE_USER: &str = r#"
    UPDATE users SET
        email = $2, password_hash = $3, nickname = $4,
        is_guest = $5, updated_at = $6
    WHERE id = $1
    RETURNING *
"#;

const UPDATE_NICKNAME: &str = r#"
    UPDATE users SET nickname = $2, updated_at = $3
    WHERE id = $1
    RETURNING *
"#;

const DELETE_USER: &str = "DELETE FROM users WHERE id = $1";

macro_rules! sql_repositories {
    ($diary_repo:ident, $user_repo:ident, $pool:ty) => {
        #[derive(Clone)]
        pub struct $diary_repo {
            pool: $pool,
        }

        impl $diary_repo {
            pub fn new(pool: $pool) -> Self {
                Self { pool }
            }
        }

        #[async_trait]
        impl DiaryRepository for $diary_repo {
            async fn find_all(&self) -> RepositoryResult<Vec<Diary>> {
                let diaries = sqlx::query_as::<_, Diary>(SELECT_ALL_DIARIES)
                    .fetch_all(&self.pool)
                    .await?;
                Ok(diaries)
            }

            async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Diary>> {
                let diaries = sqlx::query_as::<_, Diary>(SELECT_DIARIES_BY_USER)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?;
                Ok(diaries)
            }

            async fn find_by_user_and_date(
                &self,
                user_id: Uuid,
                date: NaiveDate,
            ) -> RepositoryResult<Diary> {
                sqlx::query_as::<_, Diary>(SELECT_DIARY_BY_USER_AND_DATE)
                    .bind(user_id)
                    .bind(date)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or(RepositoryError::NotFound(DIARY_NOT_FOUND))
            }

            async fn find_by_user_and_date_range(
                &self,
                user_id: Uuid,
                start: NaiveDate,
                end: NaiveDate,
            ) -> RepositoryResult<Vec<Diary>> {
                let diaries = sqlx::query_as::<_, Diary>(SELECT_DIARIES_IN_RANGE)
                    .bind(user_id)
                    .bind(start)
                    .bind(end)
                    .fetch_all(&self.pool)
                    .await?;
                Ok(diaries)
            }

            async fn create(&self, diary: NewDiary) -> RepositoryResult<Diary> {
                let now = Utc::now();
                sqlx::query_as::<_, Diary>(INSERT_DIARY)
                    .bind(Uuid::new_v4())
                    .bind(diary.user_id)
                    .bind(diary.date)
                    .bind(diary.mental.value())
                    .bind(&diary.diary)
                    .bind(now)
                    .bind(now)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| classify_write_error(e, DIARY_ALREADY_EXISTS))
            }

            async fn update(
                &self,
                user_id: Uuid,
                date: NaiveDate,
                changes: DiaryChanges,
            ) -> RepositoryResult<Diary> {
                sqlx::query_as::<_, Diary>(UPDATE_DIARY)
                    .bind(user_id)
                    .bind(date)
                    .bind(changes.mental.value())
                    .bind(&changes.diary)
                    .bind(Utc::now())
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or(RepositoryError::NotFound(DIARY_NOT_FOUND))
            }

            async fn delete(&self, user_id: Uuid, date: NaiveDate) -> RepositoryResult<()> {
                let result = sqlx::query(DELETE_DIARY)
                    .bind(user_id)
                    .bind(date)
                    .execute(&self.pool)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound(DIARY_NOT_FOUND));
                }
                Ok(())
            }

            async fn delete_by_user(&self, user_id: Uuid) -> RepositoryResult<u64> {
                let result = sqlx::query(DELETE_DIARIES_BY_USER)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await?;
                Ok(result.rows_affected())
            }
        }

        #[derive(Clone)]
        pub struct $user_repo {
            pool: $pool,
        }

        impl $user_repo {
            pub fn new(pool: $pool) -> Self {
                Self { pool }
            }
        }

        #[async_trait]
        impl UserRepository for $user_repo {
            async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
                let user = sqlx::query_as::<_, User>(SELECT_USER_BY_ID)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
                Ok(user)
            }

            async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
                let user = sqlx::query_as::<_, User>(SELECT_USER_BY_EMAIL)
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await?;
                Ok(user)
            }

            async fn find_by_refresh_token_hash(
                &self,
                token_hash: &str,
            ) -> RepositoryResult<Option<User>> {
                let user = sqlx::query_as::<_, User>(SELECT_USER_BY_REFRESH_TOKEN)
                    .bind(token_hash)
                    .fetch_optional(&self.pool)
                    .await?;
                Ok(user)
            }

            async fn find_by_provider_id(
                &self,
                provider: &str,
                provider_id: &str,
            ) -> RepositoryResult<Option<User>> {
                let user = sqlx::query_as::<_, User>(SELECT_USER_BY_PROVIDER)
                    .bind(provider)
                    .bind(provider_id)
                    .fetch_optional(&self.pool)
                    .await?;
                Ok(user)
            }

            async fn create(&self, user: NewUser) -> RepositoryResult<User> {
                let now = Utc::now();
                let conflict = if user.email.is_some() {
                    EMAIL_ALREADY_REGISTERED
                } else {
                    USER_ALREADY_EXISTS
                };

                sqlx::query_as::<_, User>(INSERT_USER)
                    .bind(user.id)
                    .bind(&user.nickname)
                    .bind(&user.email)
                    .bind(&user.password_hash)
                    .bind(user.is_guest)
                    .bind(&user.refresh_token_hash)
                    .bind(&user.provider)
                    .bind(&user.provider_id)
                    .bind(now)
                    .bind(now)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| classify_write_error(e, conflict))
            }

            async fn set_refresh_token_hash(
                &self,
                id: Uuid,
                token_hash: &str,
            ) -> RepositoryResult<()> {
                let result = sqlx::query(UPDATE_REFRESH_TOKEN)
                    .bind(id)
                    .bind(token_hash)
                    .bind(Utc::now())
                    .execute(&self.pool)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound(USER_NOT_FOUND));
                }
                Ok(())
            }

            async fn promote(&self, id: Uuid, credentials: Credentials) -> RepositoryResult<User> {
                sqlx::query_as::<_, User>(PROMOTE_USER)
                    .bind(id)
                    .bind(&credentials.email)
                    .bind(&credentials.password_hash)
                    .bind(&credentials.nickname)
                    .bind(false)
                    .bind(Utc::now())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| classify_write_error(e, EMAIL_ALREADY_REGISTERED))?
                    .ok_or(RepositoryError::NotFound(USER_NOT_FOUND))
            }

            async fn update_nickname(&self, id: Uuid, nickname: &str) -> RepositoryResult<User> {
                sqlx::query_as::<_, User>(UPDATE_NICKNAME)
                    .bind(id)
                    .bind(nickname)
                    .bind(Utc::now())
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or(RepositoryError::NotFound(USER_NOT_FOUND))
            }

            async fn delete_with_diaries(&self, id: Uuid) -> RepositoryResult<u64> {
                let mut tx = self.pool.begin().await?;

                let removed = sqlx::query(DELETE_DIARIES_BY_USER)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

                let result = sqlx::query(DELETE_USER)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                if result.rows_affected() == 0 {
                    tx.rollback().await?;
                    return Err(RepositoryError::NotFound(USER_NOT_FOUND));
                }

                tx.commit().await?;
                Ok(removed)
            }
        }
    };
}

sql_repositories!(PgDiaryRepository, PgUserRepository, PgPool);
sql_repositories!(SqliteDiaryRepository, SqliteUserRepository, SqlitePool);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{migrated_sqlite, Database};
    use crate::models::mental::MentalScore;

    async fn sqlite_pool() -> SqlitePool {
        match migrated_sqlite().await {
            Database::Sqlite(pool) => pool,
            Database::Postgres(_) => unreachable!("sqlite url must give a sqlite pool"),
        }
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn new_diary(user_id: Uuid, day: &str, mental: i32, body: &str) -> NewDiary {
        NewDiary {
            user_id,
            date: date(day),
            mental: MentalScore::new(mental).unwrap(),
            diary: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_fetch_round_trip() {
        let repo = SqliteDiaryRepository::new(sqlite_pool().await);
        let user_id = Uuid::new_v4();

        let created = repo
            .create(new_diary(user_id, "2025-01-01", 6, "はじめての日記"))
            .await
            .unwrap();
        let fetched = repo
            .find_by_user_and_date(user_id, date("2025-01-01"))
            .await
            .unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.user_id, user_id);
        assert_eq!(fetched.date, date("2025-01-01"));
        assert_eq!(fetched.mental.value(), 6);
        assert_eq!(fetched.diary, "はじめての日記");
    }

    #[tokio::test]
    async fn test_second_create_for_same_day_conflicts() {
        let repo = SqliteDiaryRepository::new(sqlite_pool().await);
        let user_id = Uuid::new_v4();

        repo.create(new_diary(user_id, "2025-01-01", 5, "first"))
            .await
            .unwrap();
        let err = repo
            .create(new_diary(user_id, "2025-01-01", 9, "second"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(DIARY_ALREADY_EXISTS)));

        let kept = repo
            .find_by_user_and_date(user_id, date("2025-01-01"))
            .await
            .unwrap();
        assert_eq!(kept.diary, "first");
        assert_eq!(kept.mental.value(), 5);
    }

    #[tokio::test]
    async fn test_same_day_for_different_users_is_allowed() {
        let repo = SqliteDiaryRepository::new(sqlite_pool().await);

        repo.create(new_diary(Uuid::new_v4(), "2025-01-01", 5, "a"))
            .await
            .unwrap();
        repo.create(new_diary(Uuid::new_v4(), "2025-01-01", 5, "b"))
            .await
            .unwrap();

        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_entry_is_not_found() {
        let repo = SqliteDiaryRepository::new(sqlite_pool().await);
        let user_id = Uuid::new_v4();
        let day = date("2099-01-01");

        let err = repo.find_by_user_and_date(user_id, day).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(DIARY_NOT_FOUND)));

        let changes = DiaryChanges {
            mental: MentalScore::new(3).unwrap(),
            diary: "nothing".into(),
        };
        let err = repo.update(user_id, day, changes).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(DIARY_NOT_FOUND)));

        let err = repo.delete(user_id, day).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(DIARY_NOT_FOUND)));
    }

    #[tokio::test]
    async fn test_update_changes_score_and_body_only() {
        let repo = SqliteDiaryRepository::new(sqlite_pool().await);
        let user_id = Uuid::new_v4();
        let created = repo
            .create(new_diary(user_id, "2025-03-03", 4, "before"))
            .await
            .unwrap();

        let updated = repo
            .update(
                user_id,
                date("2025-03-03"),
                DiaryChanges {
                    mental: MentalScore::new(8).unwrap(),
                    diary: "after".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.user_id, user_id);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.mental.value(), 8);
        assert_eq!(updated.diary, "after");
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_scoped_to_user() {
        let repo = SqliteDiaryRepository::new(sqlite_pool().await);
        let user_id = Uuid::new_v4();
        let other = Uuid::new_v4();

        for day in ["2025-01-01", "2025-01-05", "2025-01-10", "2025-01-11"] {
            repo.create(new_diary(user_id, day, 5, day)).await.unwrap();
        }
        repo.create(new_diary(other, "2025-01-05", 5, "other"))
            .await
            .unwrap();

        let found = repo
            .find_by_user_and_date_range(user_id, date("2025-01-01"), date("2025-01-10"))
            .await
            .unwrap();
        let days: Vec<String> = found.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(days, vec!["2025-01-01", "2025-01-05", "2025-01-10"]);
    }

    #[tokio::test]
    async fn test_delete_by_user_counts_rows() {
        let repo = SqliteDiaryRepository::new(sqlite_pool().await);
        let user_id = Uuid::new_v4();
        repo.create(new_diary(user_id, "2025-01-01", 5, "a"))
            .await
            .unwrap();
        repo.create(new_diary(user_id, "2025-01-02", 5, "b"))
            .await
            .unwrap();

        assert_eq!(repo.delete_by_user(user_id).await.unwrap(), 2);
        assert!(repo.find_by_user(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let users = SqliteUserRepository::new(sqlite_pool().await);
        let credentials = Credentials {
            email: "dup@example.com".into(),
            password_hash: "hash".into(),
            nickname: "nick".into(),
        };

        users
            .create(NewUser::registered(Uuid::new_v4(), credentials.clone(), "a".into()))
            .await
            .unwrap();
        let err = users
            .create(NewUser::registered(Uuid::new_v4(), credentials, "b".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(EMAIL_ALREADY_REGISTERED)));
    }

    #[tokio::test]
    async fn test_guest_promotion_keeps_id() {
        let users = SqliteUserRepository::new(sqlite_pool().await);
        let id = Uuid::new_v4();
        users
            .create(NewUser::guest(id, "hash".into()))
            .await
            .unwrap();

        let promoted = users
            .promote(
                id,
                Credentials {
                    email: "guest@example.com".into(),
                    password_hash: "pw".into(),
                    nickname: "もと ゲスト".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(promoted.id, id);
        assert!(!promoted.is_guest);
        assert_eq!(promoted.email.as_deref(), Some("guest@example.com"));
        let by_email = users.find_by_email("guest@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn test_refresh_token_lookup_follows_latest_hash() {
        let users = SqliteUserRepository::new(sqlite_pool().await);
        let id = Uuid::new_v4();
        users
            .create(NewUser::guest(id, "old".into()))
            .await
            .unwrap();

        users.set_refresh_token_hash(id, "new").await.unwrap();

        assert!(users.find_by_refresh_token_hash("old").await.unwrap().is_none());
        let found = users.find_by_refresh_token_hash("new").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(id));
    }

    fn oauth_user(provider: &str, provider_id: &str) -> NewUser {
        NewUser {
            provider: Some(provider.into()),
            provider_id: Some(provider_id.into()),
            nickname: "oauth".into(),
            ..NewUser::guest(Uuid::new_v4(), "h".into())
        }
    }

    #[tokio::test]
    async fn test_provider_identity_lookup() {
        let users = SqliteUserRepository::new(sqlite_pool().await);
        let created = users
            .create(oauth_user("google", "1234567890"))
            .await
            .unwrap();
        users
            .create(NewUser::guest(Uuid::new_v4(), "plain".into()))
            .await
            .unwrap();

        let found = users
            .find_by_provider_id("google", "1234567890")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.provider.as_deref(), Some("google"));
        assert_eq!(found.provider_id.as_deref(), Some("1234567890"));

        assert!(users
            .find_by_provider_id("github", "1234567890")
            .await
            .unwrap()
            .is_none());
        assert!(users
            .find_by_provider_id("google", "other")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_provider_identity_conflicts() {
        let users = SqliteUserRepository::new(sqlite_pool().await);
        users.create(oauth_user("google", "42")).await.unwrap();

        let err = users.create(oauth_user("google", "42")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(USER_ALREADY_EXISTS)));

        // Same subject at another provider is a different identity.
        users.create(oauth_user("github", "42")).await.unwrap();
    }

    #[tokio::test]
    async fn test_withdrawal_removes_user_and_diaries() {
        let pool = sqlite_pool().await;
        let users = SqliteUserRepository::new(pool.clone());
        let diaries = SqliteDiaryRepository::new(pool);
        let id = Uuid::new_v4();
        let bystander = Uuid::new_v4();

        users
            .create(NewUser::guest(id, "h1".into()))
            .await
            .unwrap();
        users
            .create(NewUser::guest(bystander, "h2".into()))
            .await
            .unwrap();
        diaries
            .create(new_diary(id, "2025-01-01", 5, "mine"))
            .await
            .unwrap();
        diaries
            .create(new_diary(id, "2025-01-02", 6, "mine too"))
            .await
            .unwrap();
        diaries
            .create(new_diary(bystander, "2025-01-01", 7, "theirs"))
            .await
            .unwrap();

        assert_eq!(users.delete_with_diaries(id).await.unwrap(), 2);

        assert!(users.find_by_id(id).await.unwrap().is_none());
        assert!(diaries.find_by_user(id).await.unwrap().is_empty());
        assert!(users.find_by_id(bystander).await.unwrap().is_some());
        assert_eq!(diaries.find_by_user(bystander).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_withdrawal_of_unknown_user_rolls_back() {
        let pool = sqlite_pool().await;
        let users = SqliteUserRepository::new(pool.clone());
        let diaries = SqliteDiaryRepository::new(pool);
        let orphan_owner = Uuid::new_v4();
        diaries
            .create(new_diary(orphan_owner, "2025-01-01", 5, "kept"))
            .await
            .unwrap();

        let err = users.delete_with_diaries(orphan_owner).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(USER_NOT_FOUND)));
        assert_eq!(diaries.find_by_user(orphan_owner).await.unwrap().len(), 1);
    }
}
