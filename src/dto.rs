//! Request/response DTOs.
//!
//! - `*Request` → deserialized from a JSON body or query string
//! - `*Response` → serialized to the client
//! - Field rules are expressed with `validator` derives; dates stay strings
//!   here and are parsed strictly by [`crate::models::diary::parse_date`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

const BLANK_NICKNAME: &str = "ニックネームは空白以外の文字を含めてください";

/// Length rules count raw characters; this rejects whitespace-only input.
fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed(BLANK_NICKNAME));
        return Err(err);
    }
    Ok(())
}

// ============================================================================
// Common
// ============================================================================

/// `{ "data": ... }` envelope used by the diary endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// POST /api/guest-login. The body itself is optional.
#[derive(Debug, Default, Deserialize)]
pub struct GuestLoginRequest {
    pub id: Option<Uuid>,
}

/// POST /api/refresh-token
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

/// POST /api/register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "メールアドレスの形式が正しくありません"))]
    #[validate(length(max = 254, message = "メールアドレスが長すぎます"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "パスワードは8〜128文字で指定してください"))]
    pub password: String,

    #[validate(
        length(min = 1, max = 50, message = "ニックネームは1〜50文字で指定してください"),
        custom = "validate_not_blank"
    )]
    pub nickname: String,
}

/// POST /api/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Guest login, registration and login all answer with a fresh pair.
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub token: String,
    pub refresh_token: String,
    pub id: Uuid,
}

/// POST /api/refresh-token
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

// ============================================================================
// Users
// ============================================================================

/// PATCH /api/me
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 50, message = "ニックネームは1〜50文字で指定してください"),
        custom = "validate_not_blank"
    )]
    pub nickname: String,
}

// ============================================================================
// Diaries
// ============================================================================

/// POST /api/me/diaries. `mental` is range-checked by `MentalScore`.
#[derive(Debug, Deserialize)]
pub struct CreateDiaryRequest {
    pub date: String,
    pub mental: i32,
    pub diary: String,
}

/// PUT /api/me/diaries/:date
#[derive(Debug, Deserialize)]
pub struct UpdateDiaryRequest {
    pub mental: i32,
    pub diary: String,
}

/// GET /api/me/diaries/range
#[derive(Debug, Deserialize)]
pub struct DiaryRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// ============================================================================
// Analysis
// ============================================================================

/// GET /api/me/analyze-diaries
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis_result: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            email: "a@b.com".into(),
            password: "12345678".into(),
            nickname: "ねこ".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".into(),
            ..ok_clone(&ok)
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            password: "1234567".into(),
            ..ok_clone(&ok)
        };
        assert!(short_password.validate().is_err());

        let empty_nickname = RegisterRequest {
            nickname: String::new(),
            ..ok_clone(&ok)
        };
        assert!(empty_nickname.validate().is_err());
    }

    #[test]
    fn test_whitespace_nickname_is_rejected() {
        let register = RegisterRequest {
            email: "a@b.com".into(),
            password: "12345678".into(),
            nickname: "   ".into(),
        };
        let err = register.validate().unwrap_err();
        assert!(err.to_string().contains(BLANK_NICKNAME));

        let update = UpdateProfileRequest {
            nickname: "\t \u{3000}".into(),
        };
        assert!(update.validate().is_err());

        let padded = UpdateProfileRequest {
            nickname: " ねこ ".into(),
        };
        assert!(padded.validate().is_ok());
    }

    fn ok_clone(r: &RegisterRequest) -> RegisterRequest {
        RegisterRequest {
            email: r.email.clone(),
            password: r.password.clone(),
            nickname: r.nickname.clone(),
        }
    }

    #[test]
    fn test_guest_login_id_is_optional() {
        let req: GuestLoginRequest = serde_json::from_str("{}").unwrap();
        assert!(req.id.is_none());

        let id = Uuid::new_v4();
        let req: GuestLoginRequest =
            serde_json::from_str(&format!(r#"{{"id":"{}"}}"#, id)).unwrap();
        assert_eq!(req.id, Some(id));
    }

    #[test]
    fn test_create_diary_requires_all_fields() {
        let parsed: Result<CreateDiaryRequest, _> =
            serde_json::from_str(r#"{"date":"2025-01-01","mental":5}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_auth_tokens_shape() {
        let id = Uuid::nil();
        let value = serde_json::to_value(AuthTokens {
            token: "t".into(),
            refresh_token: "r".into(),
            id,
        })
        .unwrap();
        assert_eq!(value["token"], "t");
        assert_eq!(value["refresh_token"], "r");
        assert_eq!(value["id"], id.to_string());
    }
}
