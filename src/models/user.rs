use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const GUEST_NICKNAME: &str = "Guest";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub nickname: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_guest: bool,
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    /// External sign-in identity; `(provider, provider_id)` is unique when set.
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub nickname: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_guest: bool,
    pub refresh_token_hash: Option<String>,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
}

impl NewUser {
    pub fn guest(id: Uuid, refresh_token_hash: String) -> Self {
        Self {
            id,
            nickname: GUEST_NICKNAME.to_string(),
            email: None,
            password_hash: None,
            is_guest: true,
            refresh_token_hash: Some(refresh_token_hash),
            provider: None,
            provider_id: None,
        }
    }

    pub fn registered(id: Uuid, credentials: Credentials, refresh_token_hash: String) -> Self {
        Self {
            id,
            nickname: credentials.nickname,
            email: Some(credentials.email),
            password_hash: Some(credentials.password_hash),
            is_guest: false,
            refresh_token_hash: Some(refresh_token_hash),
            provider: None,
            provider_id: None,
        }
    }
}

/// Email/password pair attached on registration or guest promotion.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub nickname: String,
    pub email: Option<String>,
    pub is_guest: bool,
    pub provider: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            nickname: u.nickname,
            email: u.email,
            is_guest: u.is_guest,
            provider: u.provider,
            created_at: u.created_at,
        }
    }
}
