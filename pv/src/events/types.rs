use serde::{Deserialize, Serialize};

/// A committed change to the library state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    /// State loaded (or seeded) at startup
    Initialized { prompt_count: usize },

    PromptAdded { id: String },
    PromptUpdated { id: String },
    PromptDeleted { id: String },

    FavoriteToggled { id: String, favorite: bool },
    RatingChanged { id: String, rating: u8, average: f64 },
    HistoryChanged { id: String },

    /// Category or search filter changed
    FiltersChanged,
    ThemeChanged { theme: String },
    SortChanged { sort: String },
    FavoritesOnlyChanged { enabled: bool },

    Imported { prompt_count: usize },
    Cleared,
    Reset { prompt_count: usize },
    Repaired,

    /// Background refresh replaced the catalog
    CatalogRefreshed { prompt_count: usize, version: String },
    /// Refresh interval or enabled flag changed
    RefreshSettingsChanged { interval_minutes: u32, enabled: bool },

    /// The in-memory change committed but could not be written
    PersistFailed { reason: String },
}

impl StateEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            StateEvent::Initialized { .. } => "Initialized",
            StateEvent::PromptAdded { .. } => "PromptAdded",
            StateEvent::PromptUpdated { .. } => "PromptUpdated",
            StateEvent::PromptDeleted { .. } => "PromptDeleted",
            StateEvent::FavoriteToggled { .. } => "FavoriteToggled",
            StateEvent::RatingChanged { .. } => "RatingChanged",
            StateEvent::HistoryChanged { .. } => "HistoryChanged",
            StateEvent::FiltersChanged => "FiltersChanged",
            StateEvent::ThemeChanged { .. } => "ThemeChanged",
            StateEvent::SortChanged { .. } => "SortChanged",
            StateEvent::FavoritesOnlyChanged { .. } => "FavoritesOnlyChanged",
            StateEvent::Imported { .. } => "Imported",
            StateEvent::Cleared => "Cleared",
            StateEvent::Reset { .. } => "Reset",
            StateEvent::Repaired => "Repaired",
            StateEvent::CatalogRefreshed { .. } => "CatalogRefreshed",
            StateEvent::RefreshSettingsChanged { .. } => "RefreshSettingsChanged",
            StateEvent::PersistFailed { .. } => "PersistFailed",
        }
    }
}
