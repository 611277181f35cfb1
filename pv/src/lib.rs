//! PromptVault - client-resident prompt library core
//!
//! Holds a catalog of reusable text templates, lets a user filter, sort,
//! favorite and rate them, fills bracketed placeholders, and persists
//! everything to a local key-value store. The catalog can be refreshed from a
//! remote source on a schedule without losing user annotations.
//!
//! # Modules
//!
//! - [`domain`] - Prompt, Category, UserRating, CacheMetadata, AppState
//! - [`store`] - typed persistence over a `kvstore::ByteStore`
//! - [`state`] - StateManager actor and its mutation API
//! - [`query`] - filtered, sorted catalog view
//! - [`events`] - StateNotifier change notification
//! - [`refresh`] - background refresh scheduler
//! - [`catalog`] - remote catalog fetch/parse and the built-in defaults
//! - [`template`] - placeholder parsing and substitution
//! - [`effects`] - theme, download and toast side effects
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod effects;
pub mod events;
pub mod query;
pub mod refresh;
pub mod state;
pub mod store;
pub mod template;

// Re-export commonly used types
pub use catalog::{CatalogFetcher, EmbeddedDefaults, HttpFetcher, RemoteCatalog, SeedSource};
pub use config::Config;
pub use domain::{AppState, CacheMetadata, Category, ExportData, Prompt, PromptDraft, UserRating};
pub use effects::{LogEffects, NoopEffects, PlatformEffects, ToastLevel};
pub use events::{StateEvent, StateNotifier, SubscriptionId};
pub use query::{SortMode, filtered_view};
pub use refresh::{RefreshConfig, RefreshScheduler, SchedulerPhase, TickOutcome};
pub use state::{InitReport, ManagerOptions, StateError, StateManager, StateResponse};
pub use store::{PersistentStore, STATE_KEY, StoreError};
pub use template::{FieldType, ParsedPlaceholders, PlaceholderField};
