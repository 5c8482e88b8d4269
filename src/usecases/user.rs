//! Account lifecycle: guest sessions, refresh, registration, login, profile
//! and withdrawal.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::jwt::{create_access_token, generate_refresh_token, hash_token};
use crate::auth::middleware::AuthUser;
use crate::auth::password::{hash_password, verify_password};
use crate::config::Config;
use crate::dto::{AuthTokens, LoginRequest, RefreshResponse, RegisterRequest};
use crate::error::{AppError, AppResult};
use crate::models::user::{Credentials, NewUser, User, UserProfile};
use crate::repositories::{UserRepository, EMAIL_ALREADY_REGISTERED, USER_NOT_FOUND};

#[derive(Clone)]
pub struct UserUsecase {
    users: Arc<dyn UserRepository>,
    config: Arc<Config>,
}

impl UserUsecase {
    pub fn new(users: Arc<dyn UserRepository>, config: Arc<Config>) -> Self {
        Self { users, config }
    }

    /// Create or resume a guest account. A client-supplied id that is unknown
    /// becomes the new guest's id; an id owned by a registered user is refused.
    pub async fn guest_login(&self, requested_id: Option<Uuid>) -> AppResult<AuthTokens> {
        let existing = match requested_id {
            Some(id) => self.users.find_by_id(id).await?,
            None => None,
        };

        match existing {
            Some(user) if !user.is_guest => {
                tracing::warn!(user_id = %user.id, "Guest login attempted with a registered user's id");
                Err(AppError::Unauthorized)
            }
            Some(user) => {
                tracing::debug!(user_id = %user.id, "Resuming guest session");
                self.issue_tokens(&user).await
            }
            None => {
                let id = requested_id.unwrap_or_else(Uuid::new_v4);
                let refresh_token = generate_refresh_token();
                let user = self
                    .users
                    .create(NewUser::guest(id, hash_token(&refresh_token)))
                    .await?;
                tracing::info!(user_id = %user.id, "Guest user created");
                self.tokens_for(&user, refresh_token)
            }
        }
    }

    pub async fn refresh(&self, raw_refresh_token: &str) -> AppResult<RefreshResponse> {
        let Some(user) = self
            .users
            .find_by_refresh_token_hash(&hash_token(raw_refresh_token))
            .await?
        else {
            tracing::warn!("Refresh attempted with an unknown token");
            return Err(AppError::Unauthorized);
        };

        let token = create_access_token(user.id, user.is_guest, &self.config)?;
        Ok(RefreshResponse { token })
    }

    /// A caller holding a guest token is promoted in place and keeps its
    /// diaries. Anyone else gets a brand-new account.
    pub async fn register(
        &self,
        req: RegisterRequest,
        caller: Option<AuthUser>,
    ) -> AppResult<AuthTokens> {
        let email = normalize_email(&req.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(EMAIL_ALREADY_REGISTERED.into()));
        }

        let credentials = Credentials {
            email,
            password_hash: hash_password(&req.password)?,
            nickname: req.nickname.trim().to_string(),
        };

        let guest = match caller {
            Some(caller) => self
                .users
                .find_by_id(caller.id)
                .await?
                .filter(|u| u.is_guest),
            None => None,
        };

        match guest {
            Some(guest) => {
                let user = self.users.promote(guest.id, credentials).await?;
                tracing::info!(user_id = %user.id, "Guest promoted to registered user");
                self.issue_tokens(&user).await
            }
            None => {
                let refresh_token = generate_refresh_token();
                let user = self
                    .users
                    .create(NewUser::registered(
                        Uuid::new_v4(),
                        credentials,
                        hash_token(&refresh_token),
                    ))
                    .await?;
                tracing::info!(user_id = %user.id, "User registered");
                self.tokens_for(&user, refresh_token)
            }
        }
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthTokens> {
        let user = self
            .users
            .find_by_email(&normalize_email(&req.email))
            .await?
            .ok_or(AppError::Unauthorized)?;

        let password_ok = match (&user.password_hash, user.is_guest) {
            (Some(hash), false) => verify_password(&req.password, hash),
            _ => false,
        };
        if !password_ok {
            return Err(AppError::Unauthorized);
        }

        self.issue_tokens(&user).await
    }

    /// Check a token's subject against the store. Unknown users are
    /// unauthorized; the guest flag is taken from the current row.
    pub async fn resolve(&self, claimed: AuthUser) -> AppResult<AuthUser> {
        match self.users.find_by_id(claimed.id).await? {
            Some(user) => Ok(AuthUser {
                id: user.id,
                is_guest: user.is_guest,
            }),
            None => {
                tracing::warn!(user_id = %claimed.id, "Token presented for a user that no longer exists");
                Err(AppError::Unauthorized)
            }
        }
    }

    pub async fn profile(&self, id: Uuid) -> AppResult<UserProfile> {
        self.users
            .find_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))
    }

    pub async fn update_nickname(&self, id: Uuid, nickname: &str) -> AppResult<UserProfile> {
        let user = self.users.update_nickname(id, nickname.trim()).await?;
        Ok(user.into())
    }

    /// Remove the user and every diary they own. Returns the diary count.
    pub async fn withdraw(&self, id: Uuid) -> AppResult<u64> {
        let removed = self.users.delete_with_diaries(id).await?;
        tracing::info!(user_id = %id, diaries = removed, "User withdrew");
        Ok(removed)
    }

    /// Rotate the refresh token and hand out a new pair.
    async fn issue_tokens(&self, user: &User) -> AppResult<AuthTokens> {
        let refresh_token = generate_refresh_token();
        self.users
            .set_refresh_token_hash(user.id, &hash_token(&refresh_token))
            .await?;
        self.tokens_for(user, refresh_token)
    }

    fn tokens_for(&self, user: &User, refresh_token: String) -> AppResult<AuthTokens> {
        Ok(AuthTokens {
            token: create_access_token(user.id, user.is_guest, &self.config)?,
            refresh_token,
            id: user.id,
        })
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
