//! The AppState aggregate

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::cache::{CacheMetadata, MIN_REFRESH_INTERVAL_MINUTES};
use super::category::{ALL_CATEGORY, Category};
use super::prompt::Prompt;
use super::rating::{MAX_RATING, UserRating, average_rating};

/// Most-recent-first history is truncated to this many entries
pub const HISTORY_CAPACITY: usize = 50;

pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_SORT: &str = "newest";

fn default_selected_category() -> String {
    ALL_CATEGORY.to_string()
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_sort() -> String {
    DEFAULT_SORT.to_string()
}

/// Treat an explicit `null` collection the same as a missing one
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Everything the library knows: catalog, user annotations, view settings and cache bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default, deserialize_with = "nullable")]
    pub prompts: Vec<Prompt>,

    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<Category>,

    #[serde(default, deserialize_with = "nullable")]
    pub favorites: Vec<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub user_ratings: BTreeMap<String, UserRating>,

    #[serde(default, deserialize_with = "nullable")]
    pub history: Vec<String>,

    #[serde(default = "default_selected_category")]
    pub selected_category: String,

    #[serde(default)]
    pub search_query: String,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default = "default_sort")]
    pub sort_by: String,

    #[serde(default)]
    pub show_favorites_only: bool,

    #[serde(default, deserialize_with = "nullable")]
    pub cache_metadata: CacheMetadata,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            prompts: Vec::new(),
            categories: Vec::new(),
            favorites: Vec::new(),
            user_ratings: BTreeMap::new(),
            history: Vec::new(),
            selected_category: default_selected_category(),
            search_query: String::new(),
            theme: default_theme(),
            sort_by: default_sort(),
            show_favorites_only: false,
            cache_metadata: CacheMetadata::default(),
        }
    }
}

impl AppState {
    pub fn prompt(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn prompt_mut(&mut self, id: &str) -> Option<&mut Prompt> {
        self.prompts.iter_mut().find(|p| p.id == id)
    }

    pub fn contains_prompt(&self, id: &str) -> bool {
        self.prompts.iter().any(|p| p.id == id)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|f| f == id)
    }

    pub fn recount_categories(&mut self) {
        Category::recount(&mut self.categories, &self.prompts);
    }

    /// Recompute one prompt's average from the stored ratings
    pub fn recompute_average(&mut self, id: &str) {
        let average = average_rating(self.user_ratings.values(), id);
        if let Some(prompt) = self.prompt_mut(id) {
            prompt.average_rating = average;
        }
    }

    /// Move `id` to the front of the history, dropping older duplicates and overflow
    pub fn push_history(&mut self, id: &str) {
        self.history.retain(|h| h != id);
        self.history.insert(0, id.to_string());
        self.history.truncate(HISTORY_CAPACITY);
    }

    /// Remove a prompt together with every annotation that references it
    ///
    /// Returns false when the id is unknown.
    pub fn remove_prompt(&mut self, id: &str) -> bool {
        let before = self.prompts.len();
        self.prompts.retain(|p| p.id != id);
        if self.prompts.len() == before {
            return false;
        }
        self.favorites.retain(|f| f != id);
        self.user_ratings.remove(id);
        self.history.retain(|h| h != id);
        true
    }

    /// Repair values a hand-edited or older state may carry
    ///
    /// Fixes empty view settings, duplicate favorites and history entries,
    /// overlong history, out-of-range ratings, ratings whose `prompt_id`
    /// disagrees with their key, and an interval below the minimum.
    /// Returns true when anything changed.
    pub fn repair(&mut self) -> bool {
        debug!("AppState::repair: called");
        let mut changed = false;

        if self.selected_category.trim().is_empty() {
            self.selected_category = default_selected_category();
            changed = true;
        }
        if self.theme.trim().is_empty() {
            self.theme = default_theme();
            changed = true;
        }
        if self.sort_by.trim().is_empty() {
            self.sort_by = default_sort();
            changed = true;
        }

        changed |= dedupe(&mut self.favorites);
        changed |= dedupe(&mut self.history);
        if self.history.len() > HISTORY_CAPACITY {
            self.history.truncate(HISTORY_CAPACITY);
            changed = true;
        }

        for (key, rating) in self.user_ratings.iter_mut() {
            if rating.rating > MAX_RATING {
                rating.rating = MAX_RATING;
                changed = true;
            }
            if rating.prompt_id != *key {
                rating.prompt_id = key.clone();
                changed = true;
            }
        }

        if self.cache_metadata.refresh_interval_minutes < MIN_REFRESH_INTERVAL_MINUTES {
            self.cache_metadata.refresh_interval_minutes = MIN_REFRESH_INTERVAL_MINUTES;
            changed = true;
        }

        changed
    }

    /// Drop favorites, ratings and history entries whose prompt no longer exists
    ///
    /// Returns true when anything was removed.
    pub fn prune_dangling(&mut self) -> bool {
        let known: HashSet<&str> = self.prompts.iter().map(|p| p.id.as_str()).collect();
        let favorites = self.favorites.len();
        let ratings = self.user_ratings.len();
        let history = self.history.len();

        self.favorites.retain(|id| known.contains(id.as_str()));
        self.user_ratings.retain(|id, _| known.contains(id.as_str()));
        self.history.retain(|id| known.contains(id.as_str()));

        favorites != self.favorites.len() || ratings != self.user_ratings.len() || history != self.history.len()
    }

    /// Recompute the average of every prompt that carries a user rating
    ///
    /// Unrated prompts keep the average their source document gave them.
    pub fn recompute_rated_averages(&mut self) {
        let rated: Vec<String> = self.user_ratings.keys().cloned().collect();
        for id in rated {
            self.recompute_average(&id);
        }
    }
}

/// Remove later duplicates in place, keeping first occurrences
fn dedupe(items: &mut Vec<String>) -> bool {
    let before = items.len();
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
    before != items.len()
}
