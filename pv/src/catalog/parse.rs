use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Prompt, generate_id};

/// Why a catalog document produced no prompts
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("No usable prompts in catalog")]
    NoPrompts,

    #[error("Fetch failed: {0}")]
    Fetch(#[from] super::fetch::FetchError),
}

/// Which document shape produced the prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// `[ {...}, ... ]`
    Array,
    /// `{ "prompts": [ ... ] }`
    PromptsKey,
    /// `{ "data": [ ... ] }`
    DataKey,
    /// `{ "Some title": {...}, ... }`
    Map,
}

/// Canonical field name for a lower-cased key with separators removed
fn canonical_key(key: &str) -> Option<&'static str> {
    let folded: String = key.chars().filter(|c| *c != '_' && *c != '-').collect::<String>().to_lowercase();
    let canonical = match folded.as_str() {
        "id" => "id",
        "title" => "title",
        "content" => "content",
        "description" => "description",
        "category" => "category",
        "tags" => "tags",
        "author" => "author",
        "difficulty" => "difficulty",
        "usagenotes" => "usageNotes",
        "estimatedtime" => "estimatedTime",
        "createdat" => "createdAt",
        "updatedat" => "updatedAt",
        "usagecount" => "usageCount",
        "averagerating" => "averageRating",
        _ => return None,
    };
    Some(canonical)
}

/// Rewrite an incoming object onto the Prompt wire names
///
/// Unknown keys and nulls are dropped; a comma-separated `tags` string is split.
/// Returns `None` when no known field is present.
fn normalize(object: &Map<String, Value>) -> Option<Map<String, Value>> {
    let mut out = Map::new();
    for (key, value) in object {
        let Some(canonical) = canonical_key(key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let value = match (canonical, value) {
            ("tags", Value::String(joined)) => Value::Array(
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| Value::String(t.to_string()))
                    .collect(),
            ),
            _ => value.clone(),
        };
        out.insert(canonical.to_string(), value);
    }
    (!out.is_empty()).then_some(out)
}

fn parse_prompt(value: &Value) -> Option<Prompt> {
    let object = normalize(value.as_object()?)?;
    match serde_json::from_value(Value::Object(object)) {
        Ok(prompt) => Some(prompt),
        Err(e) => {
            debug!(error = %e, "parse_prompt: dropping malformed entry");
            None
        }
    }
}

fn parse_list(value: &Value) -> Vec<Prompt> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(parse_prompt).collect())
        .unwrap_or_default()
}

/// Case-insensitive property lookup
fn property<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

fn parse_map(object: &Map<String, Value>) -> Vec<Prompt> {
    object
        .iter()
        .filter_map(|(key, value)| {
            let mut prompt = parse_prompt(value)?;
            if prompt.title.trim().is_empty() {
                prompt.title = key.clone();
            }
            Some(prompt)
        })
        .collect()
}

/// Parse a catalog document, trying each shape in order
///
/// The first shape that yields at least one prompt wins. Malformed entries
/// inside a shape are skipped.
pub fn parse_catalog(bytes: &[u8]) -> Result<(ParseStrategy, Vec<Prompt>), CatalogError> {
    debug!(len = bytes.len(), "parse_catalog: called");
    let root: Value = serde_json::from_slice(bytes)?;

    let attempt = match &root {
        Value::Array(_) => Some((ParseStrategy::Array, parse_list(&root))),
        Value::Object(object) => [
            (ParseStrategy::PromptsKey, "prompts"),
            (ParseStrategy::DataKey, "data"),
        ]
        .into_iter()
        .filter_map(|(strategy, name)| property(object, name).map(|v| (strategy, parse_list(v))))
        .find(|(_, prompts)| !prompts.is_empty())
        .or_else(|| Some((ParseStrategy::Map, parse_map(object)))),
        _ => None,
    };

    match attempt {
        Some((strategy, prompts)) if !prompts.is_empty() => {
            debug!(?strategy, count = prompts.len(), "parse_catalog: matched");
            Ok((strategy, prompts))
        }
        _ => {
            debug!("parse_catalog: no strategy yielded prompts");
            Err(CatalogError::NoPrompts)
        }
    }
}

/// Give missing and duplicate ids fresh values, keeping first occurrences
pub fn ensure_unique_ids(prompts: &mut [Prompt]) {
    let mut seen = HashSet::new();
    for prompt in prompts.iter_mut() {
        if prompt.id.trim().is_empty() || !seen.insert(prompt.id.clone()) {
            debug!(id = %prompt.id, "ensure_unique_ids: reassigning");
            prompt.id = generate_id();
            seen.insert(prompt.id.clone());
        }
    }
}

/// Backfill missing fields and give duplicate ids fresh values
pub fn backfill_all(prompts: &mut [Prompt], now: DateTime<Utc>) {
    ensure_unique_ids(prompts);
    for prompt in prompts.iter_mut() {
        prompt.backfill(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EXTERNAL_AUTHOR, GENERAL_CATEGORY};

    fn titles(prompts: &[Prompt]) -> Vec<&str> {
        prompts.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_bare_array() {
        let (strategy, prompts) = parse_catalog(br#"[{"title": "A"}, {"title": "B"}]"#).unwrap();
        assert_eq!(strategy, ParseStrategy::Array);
        assert_eq!(titles(&prompts), vec!["A", "B"]);
    }

    #[test]
    fn test_prompts_key_case_insensitive() {
        let (strategy, prompts) =
            parse_catalog(br#"{"Prompts": [{"Title": "A", "UsageNotes": "n", "Tags": ["x"]}]}"#).unwrap();
        assert_eq!(strategy, ParseStrategy::PromptsKey);
        assert_eq!(prompts[0].title, "A");
        assert_eq!(prompts[0].usage_notes, "n");
        assert_eq!(prompts[0].tags, vec!["x"]);
    }

    #[test]
    fn test_data_key() {
        let (strategy, prompts) = parse_catalog(br#"{"prompts": [], "data": [{"content": "body"}]}"#).unwrap();
        assert_eq!(strategy, ParseStrategy::DataKey);
        assert_eq!(prompts[0].content, "body");
    }

    #[test]
    fn test_map_uses_key_as_title() {
        let raw = br#"{"Cold Email": {"content": "Hi [Name]"}, "Titled": {"title": "Own title"}, "version": 3}"#;
        let (strategy, prompts) = parse_catalog(raw).unwrap();
        assert_eq!(strategy, ParseStrategy::Map);
        assert_eq!(titles(&prompts), vec!["Cold Email", "Own title"]);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let raw = br#"[{"title": "ok"}, 42, {"usageCount": "many"}, {"unrelated": true}, {"title": "also ok", "createdAt": null}]"#;
        let (_, prompts) = parse_catalog(raw).unwrap();
        assert_eq!(titles(&prompts), vec!["ok", "also ok"]);
    }

    #[test]
    fn test_tags_string_is_split() {
        let (_, prompts) = parse_catalog(br#"[{"title": "A", "tags": "seo, blog,"}]"#).unwrap();
        assert_eq!(prompts[0].tags, vec!["seo", "blog"]);
    }

    #[test]
    fn test_unusable_documents() {
        assert!(matches!(parse_catalog(b"not json"), Err(CatalogError::InvalidJson(_))));
        assert!(matches!(parse_catalog(b"[]"), Err(CatalogError::NoPrompts)));
        assert!(matches!(parse_catalog(b"{}"), Err(CatalogError::NoPrompts)));
        assert!(matches!(parse_catalog(b"\"text\""), Err(CatalogError::NoPrompts)));
        assert!(matches!(parse_catalog(br#"{"a": 1, "b": [1]}"#), Err(CatalogError::NoPrompts)));
    }

    #[test]
    fn test_backfill_all() {
        let now = Utc::now();
        let (_, mut prompts) = parse_catalog(br#"[{"id": "x", "title": "A"}, {"id": "x", "title": "B"}, {"title": "C"}]"#).unwrap();
        backfill_all(&mut prompts, now);

        let ids: HashSet<&str> = prompts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(prompts[0].id, "x");
        assert!(prompts.iter().all(|p| p.category == GENERAL_CATEGORY));
        assert!(prompts.iter().all(|p| p.author == EXTERNAL_AUTHOR));
        assert!(prompts.iter().all(|p| p.created_at == now));
    }
}
