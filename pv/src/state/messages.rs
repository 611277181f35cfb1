//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{AppState, CacheMetadata, Category, ExportData, Prompt, PromptDraft, UserRating};
use crate::query::SortMode;

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Channel error")]
    ChannelError,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Outcome of loading persisted state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    /// A valid persisted state was found
    pub restored: bool,
    /// The catalog was empty and had to be seeded
    pub seeded: bool,
    pub prompt_count: usize,
}

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    // Lifecycle
    Load {
        reply: oneshot::Sender<InitReport>,
    },
    SeedCatalog {
        prompts: Vec<Prompt>,
        reply: oneshot::Sender<usize>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    ValidateAndRepair {
        reply: oneshot::Sender<bool>,
    },
    Flush {
        reply: oneshot::Sender<bool>,
    },

    // Reads
    Snapshot {
        reply: oneshot::Sender<AppState>,
    },
    FilteredView {
        reply: oneshot::Sender<Vec<Prompt>>,
    },
    GetPrompt {
        id: String,
        reply: oneshot::Sender<Option<Prompt>>,
    },
    Favorites {
        reply: oneshot::Sender<Vec<Prompt>>,
    },
    History {
        reply: oneshot::Sender<Vec<Prompt>>,
    },
    Categories {
        reply: oneshot::Sender<Vec<Category>>,
    },
    ExportSnapshot {
        reply: oneshot::Sender<ExportData>,
    },

    // Catalog mutations
    AddPrompt {
        draft: PromptDraft,
        reply: oneshot::Sender<String>,
    },
    UpdatePrompt {
        prompt: Prompt,
        reply: oneshot::Sender<bool>,
    },
    DeletePrompt {
        id: String,
        reply: oneshot::Sender<bool>,
    },

    // Annotations
    ToggleFavorite {
        id: String,
        reply: oneshot::Sender<Option<bool>>,
    },
    SetRating {
        id: String,
        rating: UserRating,
        reply: oneshot::Sender<Option<f64>>,
    },
    AddToHistory {
        id: String,
        reply: oneshot::Sender<bool>,
    },

    // View settings
    SetFilters {
        category: Option<String>,
        search: Option<String>,
        reply: oneshot::Sender<()>,
    },
    SetTheme {
        theme: String,
        reply: oneshot::Sender<()>,
    },
    ToggleTheme {
        reply: oneshot::Sender<String>,
    },
    SetSortMode {
        mode: SortMode,
        reply: oneshot::Sender<()>,
    },
    SetShowFavoritesOnly {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },

    // Bulk
    Import {
        data: ExportData,
        reply: oneshot::Sender<usize>,
    },
    ClearAll {
        reply: oneshot::Sender<()>,
    },

    // Refresh bookkeeping
    ReplaceCatalog {
        prompts: Vec<Prompt>,
        reply: oneshot::Sender<CacheMetadata>,
    },
    MarkStale {
        reply: oneshot::Sender<()>,
    },
    GetCacheMetadata {
        reply: oneshot::Sender<CacheMetadata>,
    },
    UpdateRefreshSettings {
        interval_minutes: Option<u32>,
        enabled: Option<bool>,
        reply: oneshot::Sender<CacheMetadata>,
    },

    // Shutdown
    Shutdown,
}
