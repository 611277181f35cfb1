//! QueryEngine - derived catalog view
//!
//! `filtered_view` applies category, search, favorites-only and sort, in that
//! order, to a read-only state. It never mutates anything.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{ALL_CATEGORY, AppState, Prompt};

/// Catalog ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Creation time, most recent first
    #[default]
    Newest,
    Oldest,
    Title,
    Rating,
    Usage,
}

impl SortMode {
    /// Read a stored sort mode; unknown names fall back to `Newest`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "oldest" => SortMode::Oldest,
            "title" | "name" => SortMode::Title,
            "rating" => SortMode::Rating,
            "usage" => SortMode::Usage,
            _ => SortMode::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
            SortMode::Title => "title",
            SortMode::Rating => "rating",
            SortMode::Usage => "usage",
        }
    }

    fn compare(&self, a: &Prompt, b: &Prompt) -> Ordering {
        match self {
            SortMode::Newest => b.created_at.cmp(&a.created_at),
            SortMode::Oldest => a.created_at.cmp(&b.created_at),
            SortMode::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortMode::Rating => b.average_rating.total_cmp(&a.average_rating),
            SortMode::Usage => b.usage_count.cmp(&a.usage_count),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The catalog as the current filters and sort mode present it
///
/// Ties keep catalog order.
pub fn filtered_view(state: &AppState) -> Vec<Prompt> {
    let needle = state.search_query.trim().to_lowercase();
    let favorites: HashSet<&str> = state.favorites.iter().map(String::as_str).collect();
    let all = state.selected_category.is_empty() || state.selected_category == ALL_CATEGORY;

    let mut view: Vec<Prompt> = state
        .prompts
        .iter()
        .filter(|p| all || p.category == state.selected_category)
        .filter(|p| needle.is_empty() || p.matches_query(&needle))
        .filter(|p| !state.show_favorites_only || favorites.contains(p.id.as_str()))
        .cloned()
        .collect();

    let mode = SortMode::parse(&state.sort_by);
    view.sort_by(|a, b| mode.compare(a, b));
    view
}
