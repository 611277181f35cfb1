//! Domain types for PromptVault
//!
//! Core types: Prompt, Category, UserRating, CacheMetadata and the AppState
//! aggregate that owns them. ExportData is the backup/restore document.
//!
//! Everything here serializes as camelCase JSON and tolerates missing fields,
//! so older persisted states and partial remote documents still load.

mod cache;
mod category;
mod export;
mod id;
pub mod number;
mod prompt;
mod rating;
mod state;
pub mod timestamp;

pub use cache::{CacheMetadata, DEFAULT_REFRESH_INTERVAL_MINUTES, MIN_REFRESH_INTERVAL_MINUTES};
pub use category::{ALL_CATEGORY, Category, GENERAL_CATEGORY, default_categories};
pub use export::{EXPORT_FILE_NAME, ExportData};
pub use id::{generate_id, short_version};
pub use prompt::{EXTERNAL_AUTHOR, Prompt, PromptDraft};
pub use rating::{MAX_RATING, UserRating, average_rating};
pub use state::{AppState, DEFAULT_SORT, DEFAULT_THEME, HISTORY_CAPACITY};
