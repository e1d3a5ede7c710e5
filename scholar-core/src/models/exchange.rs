use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::classifier::Subject;

/// Thumbs-up / thumbs-down verdict on an answer, stored as `+1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Up,
    Down,
}

impl Rating {
    pub fn value(self) -> i16 {
        match self {
            Rating::Up => 1,
            Rating::Down => -1,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Rating::Up => "👍",
            Rating::Down => "👎",
        }
    }
}

impl TryFrom<i16> for Rating {
    type Error = InvalidRating;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Up),
            -1 => Ok(Rating::Down),
            other => Err(InvalidRating(other)),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be +1 or -1, got {0}")]
pub struct InvalidRating(pub i16);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question: String,
    pub answer: String,
    pub subject: Option<Subject>,
    pub rating: Option<Rating>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_values() {
        assert_eq!(Rating::Up.value(), 1);
        assert_eq!(Rating::Down.value(), -1);
        assert_eq!(Rating::try_from(1), Ok(Rating::Up));
        assert_eq!(Rating::try_from(-1), Ok(Rating::Down));
    }

    #[test]
    fn test_rating_rejects_out_of_range() {
        assert_eq!(Rating::try_from(0), Err(InvalidRating(0)));
        assert_eq!(Rating::try_from(5), Err(InvalidRating(5)));
        assert_eq!(InvalidRating(5).to_string(), "rating must be +1 or -1, got 5");

        let boxed: Box<dyn std::error::Error> = Box::new(InvalidRating(0));
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_rating_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Rating::Up).unwrap(), "\"up\"");
        let parsed: Rating = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(parsed, Rating::Down);
    }
}
