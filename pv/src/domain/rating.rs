//! User ratings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{number, timestamp};

/// Highest accepted rating value; 0 means unrated
pub const MAX_RATING: u8 = 5;

/// One user's rating of one prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRating {
    pub prompt_id: String,
    pub liked: bool,
    #[serde(deserialize_with = "number::deserialize_rating")]
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default = "timestamp::unset", deserialize_with = "timestamp::deserialize_lenient")]
    pub rated_at: DateTime<Utc>,
}

impl Default for UserRating {
    fn default() -> Self {
        Self {
            prompt_id: String::new(),
            liked: false,
            rating: 0,
            comment: None,
            rated_at: timestamp::unset(),
        }
    }
}

impl UserRating {
    pub fn new(prompt_id: impl Into<String>, rating: u8, now: DateTime<Utc>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            rating: rating.min(MAX_RATING),
            rated_at: now,
            ..Default::default()
        }
    }

    pub fn is_rated(&self) -> bool {
        self.rating > 0
    }
}

/// Mean of the non-zero ratings referencing `prompt_id`, 0 when there are none
pub fn average_rating<'a, I>(ratings: I, prompt_id: &str) -> f64
where
    I: IntoIterator<Item = &'a UserRating>,
{
    let (sum, count) = ratings
        .into_iter()
        .filter(|r| r.prompt_id == prompt_id && r.is_rated())
        .fold((0u32, 0u32), |(sum, count), r| (sum + u32::from(r.rating), count + 1));

    if count == 0 { 0.0 } else { f64::from(sum) / f64::from(count) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(prompt_id: &str, value: u8) -> UserRating {
        UserRating::new(prompt_id, value, Utc::now())
    }

    #[test]
    fn test_average_excludes_zero() {
        let ratings = vec![rating("p", 3), rating("p", 0), rating("p", 5)];
        assert_eq!(average_rating(&ratings, "p"), 4.0);
    }

    #[test]
    fn test_average_without_ratings() {
        let ratings = vec![rating("other", 5)];
        assert_eq!(average_rating(&ratings, "p"), 0.0);
        assert_eq!(average_rating(&Vec::new(), "p"), 0.0);
    }

    #[test]
    fn test_new_clamps() {
        assert_eq!(rating("p", 9).rating, MAX_RATING);
    }

    #[test]
    fn test_deserialize_without_comment() {
        let parsed: UserRating = serde_json::from_str(r#"{"promptId": "p", "liked": true, "rating": 4}"#).unwrap();
        assert_eq!(parsed.prompt_id, "p");
        assert!(parsed.liked);
        assert!(parsed.comment.is_none());
    }
}
