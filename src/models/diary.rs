use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::mental::MentalScore;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Diary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    #[sqlx(try_from = "i32")]
    pub mental: MentalScore,
    pub diary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A diary entry that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewDiary {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub mental: MentalScore,
    pub diary: String,
}

/// Mutable part of an entry. Owner and date never change after creation.
#[derive(Debug, Clone)]
pub struct DiaryChanges {
    pub mental: MentalScore,
    pub diary: String,
}

/// Parse a `YYYY-MM-DD` calendar date coming from a path, query or body.
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 10 {
        return Err(invalid_date(raw));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid_date(raw))
}

fn invalid_date(raw: &str) -> AppError {
    AppError::Validation(format!(
        "日付はYYYY-MM-DD形式で指定してください: {}",
        raw
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date("2025-01-20").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_other_shapes() {
        for raw in ["2025/01/20", "20250120", "2025-1-2", "2025-02-30", "", "today"] {
            assert!(
                matches!(parse_date(raw), Err(AppError::Validation(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_diary_json_shape() {
        let created_at = DateTime::parse_from_rfc3339("2025-01-20T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let diary = Diary {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            mental: MentalScore::new(7).unwrap(),
            diary: "テスト日記".into(),
            created_at,
            updated_at: created_at,
        };

        let value = serde_json::to_value(&diary).unwrap();
        assert_eq!(value["mental"], 7);
        assert_eq!(value["date"], "2025-01-20");
        assert_eq!(value["diary"], "テスト日記");
    }
}
