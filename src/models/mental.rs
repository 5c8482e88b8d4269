use serde::{Deserialize, Serialize};

pub const MIN_MENTAL: i32 = 1;
pub const MAX_MENTAL: i32 = 10;

/// Self-reported mood rating attached to a diary entry.
///
/// Only constructible through [`MentalScore::new`], so a value in hand is
/// always within `1..=10`. On the wire it is a plain JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct MentalScore(i32);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mental value must be between 1 and 10")]
pub struct MentalScoreError {
    pub value: i32,
}

impl MentalScore {
    pub fn new(value: i32) -> Result<Self, MentalScoreError> {
        if !(MIN_MENTAL..=MAX_MENTAL).contains(&value) {
            return Err(MentalScoreError { value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for MentalScore {
    type Error = MentalScoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MentalScore> for i32 {
    fn from(score: MentalScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for MentalScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
