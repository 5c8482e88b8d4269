//! Persistence gateway.
//!
//! Handlers and use-cases only see these traits. The SQL implementations for
//! PostgreSQL and SQLite live in [`crate::db::sql`].
//!
//! Constraint violations are classified from the driver's typed error
//! ([`sqlx::error::DatabaseError::is_unique_violation`]) into
//! [`RepositoryError::Conflict`]; missing rows on keyed reads and writes become
//! [`RepositoryError::NotFound`].

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::diary::{Diary, DiaryChanges, NewDiary};
use crate::models::user::{Credentials, NewUser, User};

pub const DIARY_ALREADY_EXISTS: &str = "この日付の日記は既に作成されています";
pub const DIARY_NOT_FOUND: &str = "指定された日付の日記が見つかりません";
pub const EMAIL_ALREADY_REGISTERED: &str = "このメールアドレスは既に登録されています";
pub const USER_ALREADY_EXISTS: &str = "このユーザーは既に存在します";
pub const USER_NOT_FOUND: &str = "ユーザーが見つかりません";

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Map a write error to `Conflict` when the storage engine reports a unique
/// constraint violation.
pub fn classify_write_error(err: sqlx::Error, conflict: &'static str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(conflict)
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
pub trait DiaryRepository: Send + Sync {
    async fn find_all(&self) -> RepositoryResult<Vec<Diary>>;

    async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Diary>>;

    async fn find_by_user_and_date(&self, user_id: Uuid, date: NaiveDate)
        -> RepositoryResult<Diary>;

    /// Inclusive on both ends.
    async fn find_by_user_and_date_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Diary>>;

    async fn create(&self, diary: NewDiary) -> RepositoryResult<Diary>;

    async fn update(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        changes: DiaryChanges,
    ) -> RepositoryResult<Diary>;

    async fn delete(&self, user_id: Uuid, date: NaiveDate) -> RepositoryResult<()>;

    /// Returns the number of removed entries.
    async fn delete_by_user(&self, user_id: Uuid) -> RepositoryResult<u64>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    async fn find_by_refresh_token_hash(&self, token_hash: &str)
        -> RepositoryResult<Option<User>>;

    async fn find_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> RepositoryResult<Option<User>>;

    async fn create(&self, user: NewUser) -> RepositoryResult<User>;

    async fn set_refresh_token_hash(&self, id: Uuid, token_hash: &str) -> RepositoryResult<()>;

    /// Attach credentials to a guest in place. The id and its diaries are kept.
    async fn promote(&self, id: Uuid, credentials: Credentials) -> RepositoryResult<User>;

    async fn update_nickname(&self, id: Uuid, nickname: &str) -> RepositoryResult<User>;

    /// Delete every diary owned by `id` and then the user, atomically.
    /// Returns the number of removed diaries.
    async fn delete_with_diaries(&self, id: Uuid) -> RepositoryResult<u64>;
}
