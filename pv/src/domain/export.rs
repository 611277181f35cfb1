//! Backup and restore document

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompt::Prompt;
use super::rating::UserRating;
use super::state::AppState;

/// File name handed to the download effect
pub const EXPORT_FILE_NAME: &str = "promptvault-export.json";

/// Snapshot of the user's library
///
/// Wire shape: `{ prompts, favorites, userRatings, history, exportDate }`.
/// Missing collections read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportData {
    pub prompts: Vec<Prompt>,
    pub favorites: Vec<String>,
    pub user_ratings: BTreeMap<String, UserRating>,
    pub history: Vec<String>,
    pub export_date: String,
}

impl ExportData {
    pub fn from_state(state: &AppState, now: DateTime<Utc>) -> Self {
        Self {
            prompts: state.prompts.clone(),
            favorites: state.favorites.clone(),
            user_ratings: state.user_ratings.clone(),
            history: state.history.clone(),
            export_date: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Parse an import payload
    ///
    /// The top level must be a JSON object. Explicit `null` collections are
    /// treated as empty.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let mut value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| "export document must be a JSON object".to_string())?;
        object.retain(|_, v| !v.is_null());
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PromptDraft;

    #[test]
    fn test_from_state_copies_annotations() {
        let now = Utc::now();
        let mut state = AppState::default();
        let prompt = Prompt::from_draft(PromptDraft::new("T", "B"), now);
        state.favorites.push(prompt.id.clone());
        state.history.push(prompt.id.clone());
        state.prompts.push(prompt);

        let export = ExportData::from_state(&state, now);
        assert_eq!(export.prompts.len(), 1);
        assert_eq!(export.favorites, state.favorites);
        assert_eq!(export.history, state.history);
        assert!(export.export_date.ends_with('Z'));
    }

    #[test]
    fn test_from_json_defaults_missing_fields() {
        let export = ExportData::from_json(r#"{"favorites": ["a"], "history": null}"#).unwrap();
        assert_eq!(export.favorites, vec!["a"]);
        assert!(export.history.is_empty());
        assert!(export.prompts.is_empty());
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(ExportData::from_json("not json").is_err());
        assert!(ExportData::from_json("[]").is_err());
        assert!(ExportData::from_json(r#"{"prompts": 7}"#).is_err());
    }

    #[test]
    fn test_json_keys_are_camel_case() {
        let json = ExportData::default().to_json_pretty().unwrap();
        assert!(json.contains("\"userRatings\""));
        assert!(json.contains("\"exportDate\""));
    }
}
