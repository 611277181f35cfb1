//! Prompt domain type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::category::GENERAL_CATEGORY;
use super::id::generate_id;
use super::{number, timestamp};

/// Author recorded on prompts that arrive from the remote catalog without one
pub const EXTERNAL_AUTHOR: &str = "External Source";

/// A reusable text template in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Prompt {
    /// Unique identifier, immutable once assigned
    pub id: String,

    pub title: String,

    /// Template body; may contain `[bracketed]` placeholders
    pub content: String,

    pub description: String,

    /// Category identifier (matches `Category::id`)
    pub category: String,

    pub tags: Vec<String>,

    pub author: String,

    /// Free-form difficulty label (beginner, intermediate, advanced)
    pub difficulty: String,

    pub usage_notes: String,

    pub estimated_time: String,

    #[serde(default = "timestamp::unset", deserialize_with = "timestamp::deserialize_lenient")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "timestamp::unset", deserialize_with = "timestamp::deserialize_lenient")]
    pub updated_at: DateTime<Utc>,

    #[serde(deserialize_with = "number::deserialize_count")]
    pub usage_count: u64,

    /// Mean of non-zero user ratings, 0 when unrated
    #[serde(deserialize_with = "number::deserialize_average")]
    pub average_rating: f64,
}

impl Default for Prompt {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            content: String::new(),
            description: String::new(),
            category: String::new(),
            tags: Vec::new(),
            author: String::new(),
            difficulty: String::new(),
            usage_notes: String::new(),
            estimated_time: String::new(),
            created_at: timestamp::unset(),
            updated_at: timestamp::unset(),
            usage_count: 0,
            average_rating: 0.0,
        }
    }
}

impl Prompt {
    /// Build a catalog entry from a draft, assigning a fresh id and timestamps
    pub fn from_draft(draft: PromptDraft, now: DateTime<Utc>) -> Self {
        debug!(title = %draft.title, "Prompt::from_draft: called");
        Self {
            id: generate_id(),
            title: draft.title,
            content: draft.content,
            description: draft.description,
            category: draft.category,
            tags: draft.tags,
            author: draft.author,
            difficulty: draft.difficulty,
            usage_notes: draft.usage_notes,
            estimated_time: draft.estimated_time,
            created_at: now,
            updated_at: now,
            usage_count: 0,
            average_rating: 0.0,
        }
    }

    /// Fill in the fields a remote catalog entry may omit
    ///
    /// Returns true when anything was changed.
    pub fn backfill(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if self.id.trim().is_empty() {
            self.id = generate_id();
            changed = true;
        }
        if timestamp::is_unset(&self.created_at) {
            self.created_at = now;
            changed = true;
        }
        if timestamp::is_unset(&self.updated_at) {
            self.updated_at = now;
            changed = true;
        }
        if self.category.trim().is_empty() {
            self.category = GENERAL_CATEGORY.to_string();
            changed = true;
        }
        if self.author.trim().is_empty() {
            self.author = EXTERNAL_AUTHOR.to_string();
            changed = true;
        }
        if changed {
            debug!(id = %self.id, "Prompt::backfill: filled missing fields");
        }
        changed
    }

    /// Case-insensitive substring match against title, body, description and tags
    ///
    /// `needle` must already be lower-cased. Empty fields never match.
    pub fn matches_query(&self, needle: &str) -> bool {
        let hit = |field: &str| !field.is_empty() && field.to_lowercase().contains(needle);
        hit(&self.title)
            || hit(&self.content)
            || hit(&self.description)
            || self.tags.iter().any(|tag| hit(tag))
    }
}

/// User-supplied fields for a new prompt; id and timestamps are assigned on add
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptDraft {
    pub title: String,
    pub content: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: String,
    pub difficulty: String,
    pub usage_notes: String,
    pub estimated_time: String,
}

impl PromptDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_assigns_id_and_timestamps() {
        let now = Utc::now();
        let prompt = Prompt::from_draft(PromptDraft::new("Title", "Body").with_category("fun"), now);

        assert!(!prompt.id.is_empty());
        assert_eq!(prompt.created_at, now);
        assert_eq!(prompt.updated_at, now);
        assert_eq!(prompt.category, "fun");
        assert_eq!(prompt.average_rating, 0.0);
    }

    #[test]
    fn test_backfill_fills_missing_fields() {
        let now = Utc::now();
        let mut prompt = Prompt {
            title: "Only a title".to_string(),
            ..Default::default()
        };

        assert!(prompt.backfill(now));
        assert!(!prompt.id.is_empty());
        assert_eq!(prompt.created_at, now);
        assert_eq!(prompt.updated_at, now);
        assert_eq!(prompt.category, GENERAL_CATEGORY);
        assert_eq!(prompt.author, EXTERNAL_AUTHOR);
    }

    #[test]
    fn test_backfill_keeps_present_fields() {
        let now = Utc::now();
        let created = timestamp::parse("2024-01-15").unwrap();
        let mut prompt = Prompt {
            id: "p-1".to_string(),
            category: "marketing".to_string(),
            author: "Team".to_string(),
            created_at: created,
            updated_at: created,
            ..Default::default()
        };

        assert!(!prompt.backfill(now));
        assert_eq!(prompt.id, "p-1");
        assert_eq!(prompt.created_at, created);
    }

    #[test]
    fn test_matches_query() {
        let prompt = Prompt {
            title: "React Component Generator".to_string(),
            tags: vec!["typescript".to_string(), String::new()],
            ..Default::default()
        };

        assert!(prompt.matches_query("component"));
        assert!(prompt.matches_query("typescript"));
        assert!(!prompt.matches_query("python"));
    }

    #[test]
    fn test_deserialize_partial_document() {
        let prompt: Prompt = serde_json::from_str(r#"{"title": "T", "usageCount": 3, "createdAt": "2024-01-10"}"#).unwrap();
        assert_eq!(prompt.title, "T");
        assert_eq!(prompt.usage_count, 3);
        assert!(prompt.id.is_empty());
        assert!(timestamp::is_unset(&prompt.updated_at));
        assert!(!timestamp::is_unset(&prompt.created_at));
    }
}
