//! StateManager - actor that owns AppState
//!
//! Processes commands via channels so every mutation is serialized.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::catalog::{EmbeddedDefaults, SeedSource, backfill_all, ensure_unique_ids};
use crate::domain::{
    AppState, CacheMetadata, Category, EXPORT_FILE_NAME, ExportData, GENERAL_CATEGORY, MAX_RATING, Prompt,
    PromptDraft, UserRating, default_categories, timestamp,
};
use crate::effects::{LogEffects, PlatformEffects, ToastLevel};
use crate::events::{StateEvent, StateNotifier, SubscriptionId};
use crate::query::{self, SortMode};
use crate::store::{PersistentStore, STATE_KEY};

use super::messages::{InitReport, StateCommand, StateError, StateResponse};

const COMMAND_CHANNEL_CAPACITY: usize = 256;

/// Collaborators for a StateManager
#[derive(Clone)]
pub struct ManagerOptions {
    pub state_key: String,
    pub effects: Arc<dyn PlatformEffects>,
    pub seed: Arc<dyn SeedSource>,
    pub notifier: Arc<StateNotifier>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            state_key: STATE_KEY.to_string(),
            effects: Arc::new(LogEffects),
            seed: Arc::new(EmbeddedDefaults),
            notifier: Arc::new(StateNotifier::default()),
        }
    }
}

impl ManagerOptions {
    pub fn with_state_key(mut self, key: impl Into<String>) -> Self {
        self.state_key = key.into();
        self
    }

    pub fn with_effects(mut self, effects: Arc<dyn PlatformEffects>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_seed(mut self, seed: Arc<dyn SeedSource>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<StateNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
    notifier: Arc<StateNotifier>,
    effects: Arc<dyn PlatformEffects>,
    seed: Arc<dyn SeedSource>,
}

impl StateManager {
    /// Spawn a new StateManager actor
    ///
    /// The actor starts with an empty default state; call `initialize` to
    /// load the persisted one.
    pub fn spawn(store: PersistentStore, options: ManagerOptions) -> Self {
        debug!(state_key = %options.state_key, "spawn: called");
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let actor = Actor {
            state: AppState::default(),
            store,
            key: options.state_key,
            effects: options.effects.clone(),
            notifier: options.notifier.clone(),
            dirty: false,
        };
        tokio::spawn(actor_loop(actor, rx));

        info!("StateManager spawned");
        Self {
            tx,
            notifier: options.notifier,
            effects: options.effects,
            seed: options.seed,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> StateCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)
    }

    // === Notification ===

    pub fn notifier(&self) -> &Arc<StateNotifier> {
        &self.notifier
    }

    /// Attach a synchronous change handler
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StateEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // === Lifecycle ===

    /// Load persisted state, seeding the catalog when it is empty
    pub async fn initialize(&self) -> StateResponse<InitReport> {
        debug!("initialize: called");
        let mut report = self.request(|reply| StateCommand::Load { reply }).await?;
        if report.seeded {
            let prompts = self.seed.seed().await;
            report.prompt_count = self
                .request(|reply| StateCommand::SeedCatalog { prompts, reply })
                .await?;
        }
        info!(
            restored = report.restored,
            seeded = report.seeded,
            prompts = report.prompt_count,
            "state initialized"
        );
        Ok(report)
    }

    /// Replace everything with a fresh default state and re-seed it
    pub async fn reset_to_defaults(&self) -> StateResponse<usize> {
        debug!("reset_to_defaults: called");
        self.request(|reply| StateCommand::Reset { reply }).await?;
        let prompts = self.seed.seed().await;
        self.request(|reply| StateCommand::SeedCatalog { prompts, reply })
            .await
    }

    /// Repair dangling references and out-of-range values; true if anything changed
    pub async fn validate_and_repair(&self) -> StateResponse<bool> {
        debug!("validate_and_repair: called");
        self.request(|reply| StateCommand::ValidateAndRepair { reply })
            .await
    }

    /// Write the current state; false if the write failed
    pub async fn flush(&self) -> StateResponse<bool> {
        debug!("flush: called");
        self.request(|reply| StateCommand::Flush { reply }).await
    }

    /// Shutdown the actor, writing any unsaved view settings
    ///
    /// Returns once the actor has exited.
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)?;
        self.tx.closed().await;
        Ok(())
    }

    // === Reads ===

    pub async fn snapshot(&self) -> StateResponse<AppState> {
        debug!("snapshot: called");
        self.request(|reply| StateCommand::Snapshot { reply }).await
    }

    /// The catalog filtered and sorted by the current view settings
    pub async fn filtered_view(&self) -> StateResponse<Vec<Prompt>> {
        debug!("filtered_view: called");
        self.request(|reply| StateCommand::FilteredView { reply }).await
    }

    pub async fn get_prompt(&self, id: &str) -> StateResponse<Option<Prompt>> {
        debug!(%id, "get_prompt: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::GetPrompt { id, reply }).await
    }

    /// Favorite prompts in catalog order
    pub async fn favorites(&self) -> StateResponse<Vec<Prompt>> {
        debug!("favorites: called");
        self.request(|reply| StateCommand::Favorites { reply }).await
    }

    /// History prompts, most recent first
    pub async fn history(&self) -> StateResponse<Vec<Prompt>> {
        debug!("history: called");
        self.request(|reply| StateCommand::History { reply }).await
    }

    pub async fn categories(&self) -> StateResponse<Vec<Category>> {
        debug!("categories: called");
        self.request(|reply| StateCommand::Categories { reply }).await
    }

    pub async fn export_snapshot(&self) -> StateResponse<ExportData> {
        debug!("export_snapshot: called");
        self.request(|reply| StateCommand::ExportSnapshot { reply })
            .await
    }

    /// Pretty-printed export document, also offered through the download effect
    pub async fn export_json(&self) -> StateResponse<String> {
        debug!("export_json: called");
        let data = self.export_snapshot().await?;
        let json = data
            .to_json_pretty()
            .map_err(|e| StateError::Export(e.to_string()))?;
        self.effects.download_file(EXPORT_FILE_NAME, &json);
        Ok(json)
    }

    // === Catalog mutations ===

    /// Add a prompt and return its new id
    pub async fn add_prompt(&self, draft: PromptDraft) -> StateResponse<String> {
        debug!(title = %draft.title, "add_prompt: called");
        self.request(|reply| StateCommand::AddPrompt { draft, reply }).await
    }

    /// Replace the prompt with the same id; false (and no change) if unknown
    pub async fn update_prompt(&self, prompt: Prompt) -> StateResponse<bool> {
        debug!(id = %prompt.id, "update_prompt: called");
        self.request(|reply| StateCommand::UpdatePrompt { prompt, reply })
            .await
    }

    /// Remove a prompt and every annotation referencing it; false if unknown
    pub async fn delete_prompt(&self, id: &str) -> StateResponse<bool> {
        debug!(%id, "delete_prompt: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::DeletePrompt { id, reply }).await
    }

    // === Annotations ===

    /// Flip favorite membership; returns the new membership, `None` if unknown
    pub async fn toggle_favorite(&self, id: &str) -> StateResponse<Option<bool>> {
        debug!(%id, "toggle_favorite: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::ToggleFavorite { id, reply })
            .await
    }

    /// Rate a prompt 0-5; returns its new average, `None` if unknown
    pub async fn set_rating(&self, id: &str, rating: u8) -> StateResponse<Option<f64>> {
        self.rate(id, UserRating::new(id, rating, Utc::now())).await
    }

    /// Store a full rating record for a prompt
    pub async fn rate(&self, id: &str, rating: UserRating) -> StateResponse<Option<f64>> {
        debug!(%id, rating = rating.rating, "rate: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::SetRating { id, rating, reply })
            .await
    }

    /// Move a prompt to the front of the history; false if unknown
    pub async fn add_to_history(&self, id: &str) -> StateResponse<bool> {
        debug!(%id, "add_to_history: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::AddToHistory { id, reply }).await
    }

    // === View settings ===

    /// Change the category and/or search filter
    ///
    /// These are published at once but only written with the next persist.
    pub async fn set_filters(&self, category: Option<String>, search: Option<String>) -> StateResponse<()> {
        debug!(?category, ?search, "set_filters: called");
        self.request(|reply| StateCommand::SetFilters {
            category,
            search,
            reply,
        })
        .await
    }

    pub async fn set_theme(&self, theme: &str) -> StateResponse<()> {
        debug!(%theme, "set_theme: called");
        let theme = theme.to_string();
        self.request(|reply| StateCommand::SetTheme { theme, reply }).await
    }

    /// Switch between light and dark; returns the new theme
    pub async fn toggle_theme(&self) -> StateResponse<String> {
        debug!("toggle_theme: called");
        self.request(|reply| StateCommand::ToggleTheme { reply }).await
    }

    pub async fn set_sort_mode(&self, mode: SortMode) -> StateResponse<()> {
        debug!(%mode, "set_sort_mode: called");
        self.request(|reply| StateCommand::SetSortMode { mode, reply }).await
    }

    pub async fn set_show_favorites_only(&self, enabled: bool) -> StateResponse<()> {
        debug!(enabled, "set_show_favorites_only: called");
        self.request(|reply| StateCommand::SetShowFavoritesOnly { enabled, reply })
            .await
    }

    // === Bulk ===

    /// Replace prompts, favorites, ratings and history with `data`
    pub async fn import_snapshot(&self, data: ExportData) -> StateResponse<usize> {
        debug!(prompts = data.prompts.len(), "import_snapshot: called");
        self.request(|reply| StateCommand::Import { data, reply }).await
    }

    /// Parse and import an export document
    ///
    /// A malformed document is rejected before anything changes.
    pub async fn import_json(&self, raw: &str) -> StateResponse<usize> {
        debug!(len = raw.len(), "import_json: called");
        let data = ExportData::from_json(raw).map_err(|e| {
            warn!(error = %e, "import_json: rejected");
            StateError::InvalidImport(e)
        })?;
        self.import_snapshot(data).await
    }

    /// Empty prompts, favorites, ratings and history; categories stay
    pub async fn clear_all(&self) -> StateResponse<()> {
        debug!("clear_all: called");
        self.request(|reply| StateCommand::ClearAll { reply }).await
    }

    // === Refresh bookkeeping ===

    /// Swap in a freshly fetched catalog, keeping user annotations
    pub async fn replace_catalog(&self, prompts: Vec<Prompt>) -> StateResponse<CacheMetadata> {
        debug!(count = prompts.len(), "replace_catalog: called");
        self.request(|reply| StateCommand::ReplaceCatalog { prompts, reply })
            .await
    }

    pub async fn mark_stale(&self) -> StateResponse<()> {
        debug!("mark_stale: called");
        self.request(|reply| StateCommand::MarkStale { reply }).await
    }

    pub async fn cache_metadata(&self) -> StateResponse<CacheMetadata> {
        debug!("cache_metadata: called");
        self.request(|reply| StateCommand::GetCacheMetadata { reply })
            .await
    }

    pub async fn update_refresh_settings(
        &self,
        interval_minutes: Option<u32>,
        enabled: Option<bool>,
    ) -> StateResponse<CacheMetadata> {
        debug!(?interval_minutes, ?enabled, "update_refresh_settings: called");
        self.request(|reply| StateCommand::UpdateRefreshSettings {
            interval_minutes,
            enabled,
            reply,
        })
        .await
    }
}

/// State owned by the actor task
struct Actor {
    state: AppState,
    store: PersistentStore,
    key: String,
    effects: Arc<dyn PlatformEffects>,
    notifier: Arc<StateNotifier>,
    /// Holds changes not yet written
    dirty: bool,
}

impl Actor {
    fn persist(&mut self) -> bool {
        match self.store.save(&self.key, &self.state) {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                warn!(error = %e, "persist: write failed, in-memory change kept");
                self.dirty = true;
                self.effects
                    .notify("Changes could not be saved to storage", ToastLevel::Warning);
                self.notifier.publish(StateEvent::PersistFailed { reason: e.to_string() });
                false
            }
        }
    }

    fn commit(&mut self, event: StateEvent) {
        self.persist();
        self.notifier.publish(event);
    }

    fn load(&mut self) -> InitReport {
        debug!(key = %self.key, "load: called");
        let restored = match self.store.load::<AppState>(&self.key) {
            Some(state) => {
                self.state = state;
                true
            }
            None => {
                self.state = AppState::default();
                false
            }
        };

        let mut changed = self.state.repair();
        if self.state.categories.is_empty() {
            self.state.categories = default_categories();
            changed = true;
        }
        self.state.recount_categories();

        let needs_seed = self.state.prompts.is_empty();
        if !needs_seed {
            if changed {
                self.persist();
            }
            self.notifier.publish(StateEvent::Initialized {
                prompt_count: self.state.prompts.len(),
            });
        }

        InitReport {
            restored,
            seeded: needs_seed,
            prompt_count: self.state.prompts.len(),
        }
    }

    fn seed_catalog(&mut self, mut prompts: Vec<Prompt>) -> usize {
        if !self.state.prompts.is_empty() {
            debug!("seed_catalog: catalog already populated, ignoring seed");
            return self.state.prompts.len();
        }
        backfill_all(&mut prompts, Utc::now());
        self.state.prompts = prompts;
        self.state.recount_categories();
        let prompt_count = self.state.prompts.len();
        self.commit(StateEvent::Initialized { prompt_count });
        prompt_count
    }

    fn reset(&mut self) {
        self.state = AppState::default();
        self.state.categories = default_categories();
        self.state.recount_categories();
        self.commit(StateEvent::Reset { prompt_count: 0 });
    }

    fn validate_and_repair(&mut self) -> bool {
        let mut changed = self.state.repair();
        changed |= self.state.prune_dangling();
        if self.state.categories.is_empty() {
            self.state.categories = default_categories();
            changed = true;
        }
        self.state.recount_categories();
        if changed {
            info!("state repaired");
            self.commit(StateEvent::Repaired);
        }
        changed
    }

    fn add_prompt(&mut self, draft: PromptDraft) -> String {
        let mut prompt = Prompt::from_draft(draft, Utc::now());
        if prompt.category.trim().is_empty() {
            prompt.category = GENERAL_CATEGORY.to_string();
        }
        let id = prompt.id.clone();
        self.state.prompts.push(prompt);
        self.state.recount_categories();
        self.commit(StateEvent::PromptAdded { id: id.clone() });
        id
    }

    fn update_prompt(&mut self, mut prompt: Prompt) -> bool {
        let Some(index) = self.state.prompts.iter().position(|p| p.id == prompt.id) else {
            debug!(id = %prompt.id, "update_prompt: unknown id, ignoring");
            return false;
        };
        prompt.updated_at = Utc::now();
        let id = prompt.id.clone();
        self.state.prompts[index] = prompt;
        if self.state.user_ratings.contains_key(&id) {
            self.state.recompute_average(&id);
        }
        self.state.recount_categories();
        self.commit(StateEvent::PromptUpdated { id });
        true
    }

    fn delete_prompt(&mut self, id: String) -> bool {
        if !self.state.remove_prompt(&id) {
            debug!(%id, "delete_prompt: unknown id, ignoring");
            return false;
        }
        self.state.recount_categories();
        self.commit(StateEvent::PromptDeleted { id });
        true
    }

    fn toggle_favorite(&mut self, id: String) -> Option<bool> {
        if !self.state.contains_prompt(&id) {
            debug!(%id, "toggle_favorite: unknown id, ignoring");
            return None;
        }
        let favorite = if self.state.is_favorite(&id) {
            self.state.favorites.retain(|f| *f != id);
            false
        } else {
            self.state.favorites.push(id.clone());
            true
        };
        self.commit(StateEvent::FavoriteToggled { id, favorite });
        Some(favorite)
    }

    fn set_rating(&mut self, id: String, mut rating: UserRating) -> Option<f64> {
        if !self.state.contains_prompt(&id) {
            debug!(%id, "set_rating: unknown id, ignoring");
            return None;
        }
        rating.prompt_id = id.clone();
        rating.rating = rating.rating.min(MAX_RATING);
        if timestamp::is_unset(&rating.rated_at) {
            rating.rated_at = Utc::now();
        }
        let value = rating.rating;
        self.state.user_ratings.insert(id.clone(), rating);
        self.state.recompute_average(&id);

        let average = self.state.prompt(&id).map_or(0.0, |p| p.average_rating);
        self.commit(StateEvent::RatingChanged {
            id,
            rating: value,
            average,
        });
        Some(average)
    }

    fn add_to_history(&mut self, id: String) -> bool {
        if !self.state.contains_prompt(&id) {
            debug!(%id, "add_to_history: unknown id, ignoring");
            return false;
        }
        self.state.push_history(&id);
        self.commit(StateEvent::HistoryChanged { id });
        true
    }

    fn set_filters(&mut self, category: Option<String>, search: Option<String>) {
        if let Some(category) = category {
            self.state.selected_category = category;
        }
        if let Some(search) = search {
            self.state.search_query = search;
        }
        self.dirty = true;
        self.notifier.publish(StateEvent::FiltersChanged);
    }

    fn set_theme(&mut self, theme: String) {
        self.state.theme = theme.clone();
        self.effects.apply_theme(&theme);
        self.commit(StateEvent::ThemeChanged { theme });
    }

    fn toggle_theme(&mut self) -> String {
        let next = if self.state.theme == "light" { "dark" } else { "light" };
        self.set_theme(next.to_string());
        next.to_string()
    }

    fn import(&mut self, data: ExportData) -> usize {
        let mut prompts = data.prompts;
        ensure_unique_ids(&mut prompts);
        self.state.prompts = prompts;
        self.state.favorites = data.favorites;
        self.state.user_ratings = data.user_ratings;
        self.state.history = data.history;
        self.state.repair();
        self.state.recompute_rated_averages();
        self.state.recount_categories();
        let prompt_count = self.state.prompts.len();
        self.commit(StateEvent::Imported { prompt_count });
        prompt_count
    }

    fn clear_all(&mut self) {
        self.state.prompts.clear();
        self.state.favorites.clear();
        self.state.user_ratings.clear();
        self.state.history.clear();
        self.state.recount_categories();
        self.commit(StateEvent::Cleared);
    }

    fn replace_catalog(&mut self, mut prompts: Vec<Prompt>) -> CacheMetadata {
        backfill_all(&mut prompts, Utc::now());
        self.state.prompts = prompts;
        self.state.recompute_rated_averages();
        self.state.recount_categories();
        self.state.cache_metadata.mark_refreshed(Utc::now());

        let meta = self.state.cache_metadata.clone();
        self.commit(StateEvent::CatalogRefreshed {
            prompt_count: self.state.prompts.len(),
            version: meta.data_version.clone(),
        });
        meta
    }

    fn update_refresh_settings(&mut self, interval_minutes: Option<u32>, enabled: Option<bool>) -> CacheMetadata {
        if let Some(minutes) = interval_minutes {
            self.state.cache_metadata.set_interval_minutes(minutes);
        }
        if let Some(enabled) = enabled {
            self.state.cache_metadata.enabled = enabled;
        }
        let meta = self.state.cache_metadata.clone();
        self.commit(StateEvent::RefreshSettingsChanged {
            interval_minutes: meta.refresh_interval_minutes,
            enabled: meta.enabled,
        });
        meta
    }

    fn favorites(&self) -> Vec<Prompt> {
        self.state
            .prompts
            .iter()
            .filter(|p| self.state.is_favorite(&p.id))
            .cloned()
            .collect()
    }

    fn history(&self) -> Vec<Prompt> {
        self.state
            .history
            .iter()
            .filter_map(|id| self.state.prompt(id).cloned())
            .collect()
    }
}

/// Main actor loop
async fn actor_loop(mut actor: Actor, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("actor_loop: called");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            // Lifecycle
            StateCommand::Load { reply } => {
                debug!("actor_loop: Load command");
                let _ = reply.send(actor.load());
            }
            StateCommand::SeedCatalog { prompts, reply } => {
                debug!(count = prompts.len(), "actor_loop: SeedCatalog command");
                let _ = reply.send(actor.seed_catalog(prompts));
            }
            StateCommand::Reset { reply } => {
                debug!("actor_loop: Reset command");
                actor.reset();
                let _ = reply.send(());
            }
            StateCommand::ValidateAndRepair { reply } => {
                debug!("actor_loop: ValidateAndRepair command");
                let _ = reply.send(actor.validate_and_repair());
            }
            StateCommand::Flush { reply } => {
                debug!("actor_loop: Flush command");
                let _ = reply.send(actor.persist());
            }

            // Reads
            StateCommand::Snapshot { reply } => {
                let _ = reply.send(actor.state.clone());
            }
            StateCommand::FilteredView { reply } => {
                let _ = reply.send(query::filtered_view(&actor.state));
            }
            StateCommand::GetPrompt { id, reply } => {
                let _ = reply.send(actor.state.prompt(&id).cloned());
            }
            StateCommand::Favorites { reply } => {
                let _ = reply.send(actor.favorites());
            }
            StateCommand::History { reply } => {
                let _ = reply.send(actor.history());
            }
            StateCommand::Categories { reply } => {
                let _ = reply.send(actor.state.categories.clone());
            }
            StateCommand::ExportSnapshot { reply } => {
                let _ = reply.send(ExportData::from_state(&actor.state, Utc::now()));
            }

            // Catalog mutations
            StateCommand::AddPrompt { draft, reply } => {
                debug!("actor_loop: AddPrompt command");
                let _ = reply.send(actor.add_prompt(draft));
            }
            StateCommand::UpdatePrompt { prompt, reply } => {
                debug!(id = %prompt.id, "actor_loop: UpdatePrompt command");
                let _ = reply.send(actor.update_prompt(prompt));
            }
            StateCommand::DeletePrompt { id, reply } => {
                debug!(%id, "actor_loop: DeletePrompt command");
                let _ = reply.send(actor.delete_prompt(id));
            }

            // Annotations
            StateCommand::ToggleFavorite { id, reply } => {
                debug!(%id, "actor_loop: ToggleFavorite command");
                let _ = reply.send(actor.toggle_favorite(id));
            }
            StateCommand::SetRating { id, rating, reply } => {
                debug!(%id, "actor_loop: SetRating command");
                let _ = reply.send(actor.set_rating(id, rating));
            }
            StateCommand::AddToHistory { id, reply } => {
                debug!(%id, "actor_loop: AddToHistory command");
                let _ = reply.send(actor.add_to_history(id));
            }

            // View settings
            StateCommand::SetFilters {
                category,
                search,
                reply,
            } => {
                actor.set_filters(category, search);
                let _ = reply.send(());
            }
            StateCommand::SetTheme { theme, reply } => {
                actor.set_theme(theme);
                let _ = reply.send(());
            }
            StateCommand::ToggleTheme { reply } => {
                let _ = reply.send(actor.toggle_theme());
            }
            StateCommand::SetSortMode { mode, reply } => {
                actor.state.sort_by = mode.as_str().to_string();
                actor.commit(StateEvent::SortChanged {
                    sort: mode.as_str().to_string(),
                });
                let _ = reply.send(());
            }
            StateCommand::SetShowFavoritesOnly { enabled, reply } => {
                actor.state.show_favorites_only = enabled;
                actor.commit(StateEvent::FavoritesOnlyChanged { enabled });
                let _ = reply.send(());
            }

            // Bulk
            StateCommand::Import { data, reply } => {
                debug!("actor_loop: Import command");
                let _ = reply.send(actor.import(data));
            }
            StateCommand::ClearAll { reply } => {
                debug!("actor_loop: ClearAll command");
                actor.clear_all();
                let _ = reply.send(());
            }

            // Refresh bookkeeping
            StateCommand::ReplaceCatalog { prompts, reply } => {
                debug!(count = prompts.len(), "actor_loop: ReplaceCatalog command");
                let _ = reply.send(actor.replace_catalog(prompts));
            }
            StateCommand::MarkStale { reply } => {
                if !actor.state.cache_metadata.is_stale {
                    actor.state.cache_metadata.is_stale = true;
                    actor.persist();
                }
                let _ = reply.send(());
            }
            StateCommand::GetCacheMetadata { reply } => {
                let _ = reply.send(actor.state.cache_metadata.clone());
            }
            StateCommand::UpdateRefreshSettings {
                interval_minutes,
                enabled,
                reply,
            } => {
                debug!("actor_loop: UpdateRefreshSettings command");
                let _ = reply.send(actor.update_refresh_settings(interval_minutes, enabled));
            }

            // Shutdown
            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                if actor.dirty {
                    actor.persist();
                }
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("actor_loop: exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HISTORY_CAPACITY;
    use crate::effects::testing::RecordingEffects;
    use crate::store::testing::FailingStore;
    use kvstore::{ByteStore, MemoryStore};
    use std::sync::Mutex;

    struct FixedSeed(Vec<Prompt>);

    #[async_trait::async_trait]
    impl SeedSource for FixedSeed {
        async fn seed(&self) -> Vec<Prompt> {
            self.0.clone()
        }
    }

    fn seeded(titles: &[&str]) -> Arc<dyn SeedSource> {
        let prompts = titles
            .iter()
            .map(|t| Prompt {
                title: t.to_string(),
                category: "marketing".to_string(),
                ..Default::default()
            })
            .collect();
        Arc::new(FixedSeed(prompts))
    }

    struct Harness {
        manager: StateManager,
        backend: Arc<MemoryStore>,
        effects: Arc<RecordingEffects>,
        events: Arc<Mutex<Vec<StateEvent>>>,
    }

    async fn harness_with(backend: Arc<MemoryStore>, seed: Arc<dyn SeedSource>) -> Harness {
        let effects = Arc::new(RecordingEffects::default());
        let options = ManagerOptions::default()
            .with_effects(effects.clone())
            .with_seed(seed);
        let manager = StateManager::spawn(PersistentStore::new(backend.clone()), options);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        manager.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        manager.initialize().await.unwrap();
        Harness {
            manager,
            backend,
            effects,
            events,
        }
    }

    async fn harness() -> Harness {
        harness_with(Arc::new(MemoryStore::new()), seeded(&[])).await
    }

    fn persisted(backend: &MemoryStore) -> AppState {
        let bytes = backend.get(STATE_KEY).unwrap().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_seeds_empty_store() {
        let h = harness_with(Arc::new(MemoryStore::new()), Arc::new(EmbeddedDefaults)).await;

        let state = h.manager.snapshot().await.unwrap();
        assert_eq!(state.prompts.len(), 10);
        assert_eq!(state.categories.len(), 12);
        let all = state.categories.iter().find(|c| c.is_all()).unwrap();
        assert_eq!(all.prompt_count, 10);

        assert_eq!(persisted(&h.backend).prompts.len(), 10);
        assert!(matches!(h.events.lock().unwrap()[0], StateEvent::Initialized { prompt_count: 10 }));
    }

    #[tokio::test]
    async fn test_initialize_restores_persisted_state() {
        let backend = Arc::new(MemoryStore::new());
        let mut saved = AppState::default();
        saved.prompts.push(Prompt {
            id: "kept".to_string(),
            title: "Kept".to_string(),
            ..Default::default()
        });
        saved.theme = "dark".to_string();
        backend.put(STATE_KEY, &serde_json::to_vec(&saved).unwrap()).unwrap();

        let h = harness_with(backend, seeded(&["Seed"])).await;
        let state = h.manager.snapshot().await.unwrap();
        assert_eq!(state.prompts.len(), 1);
        assert_eq!(state.prompts[0].id, "kept");
        assert_eq!(state.theme, "dark");
        assert_eq!(state.categories.len(), 12);
    }

    #[tokio::test]
    async fn test_initialize_repairs_out_of_range_numbers() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .put(
                STATE_KEY,
                br#"{"prompts":[{"id":"a","title":"Kept","usageCount":-2}],"favorites":["a"],"userRatings":{"a":{"promptId":"a","rating":-1}}}"#,
            )
            .unwrap();

        let h = harness_with(backend, seeded(&["Seed"])).await;
        let state = h.manager.snapshot().await.unwrap();
        assert_eq!(state.prompts.len(), 1);
        assert_eq!(state.prompts[0].title, "Kept");
        assert_eq!(state.prompts[0].usage_count, 0);
        assert_eq!(state.favorites, vec!["a"]);
        assert_eq!(state.user_ratings["a"].rating, 0);
        assert_eq!(state.prompts[0].average_rating, 0.0);
    }

    #[tokio::test]
    async fn test_initialize_recovers_from_corrupt_state() {
        let backend = Arc::new(MemoryStore::new());
        backend.put(STATE_KEY, b"\x00\x01 definitely not json").unwrap();

        let h = harness_with(backend, seeded(&["Seed"])).await;
        let state = h.manager.snapshot().await.unwrap();
        assert_eq!(state.prompts.len(), 1);
        assert_eq!(state.prompts[0].title, "Seed");
        assert_eq!(persisted(&h.backend).prompts.len(), 1);
    }

    #[tokio::test]
    async fn test_add_and_update_keep_ids() {
        let h = harness().await;
        let a = h.manager.add_prompt(PromptDraft::new("A", "body")).await.unwrap();
        let b = h.manager.add_prompt(PromptDraft::new("B", "body")).await.unwrap();
        assert_ne!(a, b);

        let mut prompt = h.manager.get_prompt(&a).await.unwrap().unwrap();
        assert_eq!(prompt.category, GENERAL_CATEGORY);
        let created = prompt.created_at;
        prompt.title = "A2".to_string();
        assert!(h.manager.update_prompt(prompt).await.unwrap());

        let updated = h.manager.get_prompt(&a).await.unwrap().unwrap();
        assert_eq!(updated.id, a);
        assert_eq!(updated.title, "A2");
        assert_eq!(updated.created_at, created);
        assert!(updated.updated_at >= created);

        let ghost = Prompt {
            id: "ghost".to_string(),
            ..Default::default()
        };
        assert!(!h.manager.update_prompt(ghost).await.unwrap());
        assert_eq!(h.manager.snapshot().await.unwrap().prompts.len(), 2);
    }

    #[tokio::test]
    async fn test_category_counts_follow_catalog() {
        let h = harness().await;
        let id = h
            .manager
            .add_prompt(PromptDraft::new("A", "b").with_category("fun"))
            .await
            .unwrap();
        let count = |cats: &[Category], id: &str| cats.iter().find(|c| c.id == id).unwrap().prompt_count;

        let cats = h.manager.categories().await.unwrap();
        assert_eq!(count(&cats, "fun"), 1);
        assert_eq!(count(&cats, "all"), 1);

        h.manager.delete_prompt(&id).await.unwrap();
        let cats = h.manager.categories().await.unwrap();
        assert_eq!(count(&cats, "fun"), 0);
        assert_eq!(count(&cats, "all"), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_is_idempotent() {
        let h = harness().await;
        let id = h.manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();
        h.manager.toggle_favorite(&id).await.unwrap();
        h.manager.set_rating(&id, 4).await.unwrap();
        h.manager.add_to_history(&id).await.unwrap();

        assert!(h.manager.delete_prompt(&id).await.unwrap());
        let state = h.manager.snapshot().await.unwrap();
        assert!(state.favorites.is_empty());
        assert!(state.user_ratings.is_empty());
        assert!(state.history.is_empty());

        assert!(!h.manager.delete_prompt(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_favorite() {
        let h = harness().await;
        let id = h.manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();

        assert_eq!(h.manager.toggle_favorite(&id).await.unwrap(), Some(true));
        assert_eq!(h.manager.favorites().await.unwrap().len(), 1);
        assert_eq!(h.manager.toggle_favorite(&id).await.unwrap(), Some(false));
        assert!(h.manager.favorites().await.unwrap().is_empty());

        assert_eq!(h.manager.toggle_favorite("ghost").await.unwrap(), None);
        assert!(h.manager.snapshot().await.unwrap().favorites.is_empty());
    }

    #[tokio::test]
    async fn test_rating_recomputes_average() {
        let h = harness().await;
        let id = h.manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();

        assert_eq!(h.manager.set_rating(&id, 3).await.unwrap(), Some(3.0));
        assert_eq!(h.manager.set_rating(&id, 9).await.unwrap(), Some(5.0));
        assert_eq!(h.manager.set_rating(&id, 0).await.unwrap(), Some(0.0));
        assert_eq!(h.manager.set_rating("ghost", 4).await.unwrap(), None);

        let state = h.manager.snapshot().await.unwrap();
        assert_eq!(state.user_ratings[&id].prompt_id, id);
        assert!(!state.user_ratings.contains_key("ghost"));
    }

    #[tokio::test]
    async fn test_history_moves_to_front_and_caps() {
        let h = harness().await;
        let mut ids = Vec::new();
        for i in 0..(HISTORY_CAPACITY + 5) {
            ids.push(h.manager.add_prompt(PromptDraft::new(format!("P{i}"), "b")).await.unwrap());
        }
        for id in &ids {
            h.manager.add_to_history(id).await.unwrap();
        }
        h.manager.add_to_history(&ids[30]).await.unwrap();

        let history = h.manager.history().await.unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history[0].id, ids[30]);
        assert_eq!(history[1].id, ids[ids.len() - 1]);
        assert!(!h.manager.add_to_history("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let h = harness().await;
        let a = h.manager.add_prompt(PromptDraft::new("A", "b").with_tags(["x"])).await.unwrap();
        let b = h.manager.add_prompt(PromptDraft::new("B", "b")).await.unwrap();
        h.manager.toggle_favorite(&a).await.unwrap();
        h.manager.set_rating(&b, 4).await.unwrap();
        h.manager.add_to_history(&b).await.unwrap();
        h.manager.add_to_history(&a).await.unwrap();

        let exported = h.manager.export_snapshot().await.unwrap();
        h.manager.clear_all().await.unwrap();
        assert!(h.manager.snapshot().await.unwrap().prompts.is_empty());

        h.manager.import_snapshot(exported.clone()).await.unwrap();
        let again = h.manager.export_snapshot().await.unwrap();
        assert_eq!(again.prompts, exported.prompts);
        assert_eq!(again.favorites, exported.favorites);
        assert_eq!(again.user_ratings, exported.user_ratings);
        assert_eq!(again.history, exported.history);
    }

    #[tokio::test]
    async fn test_import_malformed_leaves_state_unchanged() {
        let h = harness().await;
        h.manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();
        let before = h.manager.snapshot().await.unwrap();

        let result = h.manager.import_json(r#"{"prompts": "nope"}"#).await;
        assert!(matches!(result, Err(StateError::InvalidImport(_))));
        assert_eq!(h.manager.snapshot().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_import_json_defaults_missing_fields() {
        let h = harness().await;
        let count = h
            .manager
            .import_json(r#"{"prompts": [{"id": "p1", "title": "Imported"}], "favorites": ["p1", "ghost"]}"#)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let state = h.manager.snapshot().await.unwrap();
        assert_eq!(state.favorites, vec!["p1", "ghost"]);
        assert!(state.history.is_empty());
    }

    #[tokio::test]
    async fn test_import_after_refresh_keeps_annotations() {
        let h = harness().await;
        let mine = h.manager.add_prompt(PromptDraft::new("Mine", "b")).await.unwrap();
        h.manager.toggle_favorite(&mine).await.unwrap();
        h.manager.set_rating(&mine, 4).await.unwrap();
        h.manager.add_to_history(&mine).await.unwrap();
        h.manager
            .replace_catalog(vec![Prompt {
                title: "Remote".to_string(),
                ..Default::default()
            }])
            .await
            .unwrap();

        let exported = h.manager.export_snapshot().await.unwrap();
        h.manager.import_snapshot(exported.clone()).await.unwrap();
        let again = h.manager.export_snapshot().await.unwrap();

        assert_eq!(again.favorites, vec![mine.clone()]);
        assert_eq!(again.history, vec![mine.clone()]);
        assert_eq!(again.user_ratings, exported.user_ratings);
        assert_eq!(again.user_ratings[&mine].rating, 4);
        assert_eq!(again.prompts, exported.prompts);
    }

    #[tokio::test]
    async fn test_export_json_offers_download() {
        let h = harness().await;
        h.manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();
        let json = h.manager.export_json().await.unwrap();

        let downloads = h.effects.downloads.lock().unwrap();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].0, EXPORT_FILE_NAME);
        assert_eq!(downloads[0].1, json);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_categories() {
        let h = harness().await;
        h.manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();
        h.manager.clear_all().await.unwrap();

        let state = h.manager.snapshot().await.unwrap();
        assert!(state.prompts.is_empty());
        assert_eq!(state.categories.len(), 12);
        assert!(persisted(&h.backend).prompts.is_empty());
    }

    #[tokio::test]
    async fn test_filters_persist_with_next_write() {
        let h = harness().await;
        h.manager
            .set_filters(Some("fun".to_string()), Some("email".to_string()))
            .await
            .unwrap();

        assert_eq!(h.manager.snapshot().await.unwrap().search_query, "email");
        assert_eq!(persisted(&h.backend).search_query, "");

        h.manager.set_show_favorites_only(true).await.unwrap();
        let saved = persisted(&h.backend);
        assert_eq!(saved.search_query, "email");
        assert_eq!(saved.selected_category, "fun");
        assert!(saved.show_favorites_only);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_filters() {
        let h = harness().await;
        h.manager.set_filters(None, Some("later".to_string())).await.unwrap();
        h.manager.shutdown().await.unwrap();

        assert_eq!(persisted(&h.backend).search_query, "later");
        assert!(matches!(h.manager.snapshot().await, Err(StateError::ChannelError)));
    }

    #[tokio::test]
    async fn test_theme_and_sort() {
        let h = harness().await;
        assert_eq!(h.manager.toggle_theme().await.unwrap(), "dark");
        assert_eq!(h.manager.toggle_theme().await.unwrap(), "light");
        assert_eq!(*h.effects.themes.lock().unwrap(), vec!["dark", "light"]);

        h.manager.set_sort_mode(SortMode::Oldest).await.unwrap();
        assert_eq!(persisted(&h.backend).sort_by, "oldest");
    }

    #[tokio::test]
    async fn test_filtered_view_uses_state_settings() {
        let h = harness().await;
        h.manager.add_prompt(PromptDraft::new("Email", "b")).await.unwrap();
        h.manager.add_prompt(PromptDraft::new("Other", "b")).await.unwrap();
        h.manager.set_filters(None, Some("email".to_string())).await.unwrap();

        let view = h.manager.filtered_view().await.unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Email");
    }

    #[tokio::test]
    async fn test_replace_catalog_preserves_annotations() {
        let h = harness().await;
        let id = h.manager.add_prompt(PromptDraft::new("Old", "b")).await.unwrap();
        h.manager.toggle_favorite(&id).await.unwrap();
        h.manager.set_rating(&id, 5).await.unwrap();

        let fresh = vec![
            Prompt {
                id: id.clone(),
                title: "Refreshed".to_string(),
                ..Default::default()
            },
            Prompt {
                title: "New".to_string(),
                ..Default::default()
            },
        ];
        let meta = h.manager.replace_catalog(fresh).await.unwrap();
        assert!(meta.last_background_refresh.is_some());
        assert!(!meta.is_stale);
        assert_eq!(meta.data_version.len(), 8);

        let state = h.manager.snapshot().await.unwrap();
        assert_eq!(state.prompts.len(), 2);
        assert_eq!(state.favorites, vec![id.clone()]);
        assert_eq!(state.user_ratings[&id].rating, 5);
        assert_eq!(state.prompt(&id).unwrap().average_rating, 5.0);
        assert_eq!(state.prompts[1].category, GENERAL_CATEGORY);
    }

    #[tokio::test]
    async fn test_validate_and_repair_prunes_dangling() {
        let h = harness().await;
        let id = h.manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();
        h.manager.toggle_favorite(&id).await.unwrap();
        h.manager.replace_catalog(vec![Prompt::default()]).await.unwrap();

        assert!(h.manager.validate_and_repair().await.unwrap());
        assert!(h.manager.snapshot().await.unwrap().favorites.is_empty());
        assert!(!h.manager.validate_and_repair().await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_to_defaults_reseeds() {
        let h = harness_with(Arc::new(MemoryStore::new()), seeded(&["One", "Two"])).await;
        h.manager.add_prompt(PromptDraft::new("Extra", "b")).await.unwrap();
        h.manager.set_theme("dark").await.unwrap();

        let count = h.manager.reset_to_defaults().await.unwrap();
        assert_eq!(count, 2);
        let state = h.manager.snapshot().await.unwrap();
        assert_eq!(state.theme, "light");
        assert_eq!(state.prompts.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_settings_are_persisted() {
        let h = harness().await;
        let meta = h.manager.update_refresh_settings(Some(0), Some(false)).await.unwrap();
        assert_eq!(meta.refresh_interval_minutes, 1);
        assert!(!meta.enabled);

        let saved = persisted(&h.backend);
        assert_eq!(saved.cache_metadata.refresh_interval_minutes, 1);
        assert!(!saved.cache_metadata.enabled);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_memory_and_warns() {
        let backend = Arc::new(FailingStore::new());
        let effects = Arc::new(RecordingEffects::default());
        let options = ManagerOptions::default()
            .with_effects(effects.clone())
            .with_seed(seeded(&[]));
        let manager = StateManager::spawn(PersistentStore::new(backend.clone()), options);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        manager.subscribe(move |e| sink.lock().unwrap().push(e.event_type()));
        manager.initialize().await.unwrap();

        let id = manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();
        assert!(manager.get_prompt(&id).await.unwrap().is_some());

        let seen = events.lock().unwrap().clone();
        assert!(seen.contains(&"PersistFailed"));
        assert!(seen.contains(&"PromptAdded"));
        assert!(
            effects
                .toasts
                .lock()
                .unwrap()
                .iter()
                .any(|(_, level)| *level == ToastLevel::Warning)
        );

        backend.set_failing(false);
        assert!(manager.flush().await.unwrap());
        let bytes = backend.get(STATE_KEY).unwrap().unwrap();
        let saved: AppState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(saved.prompts.len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_corrupt_state() {
        let h = harness().await;
        h.manager.subscribe(|_| panic!("subscriber failure"));

        let id = h.manager.add_prompt(PromptDraft::new("A", "b")).await.unwrap();
        assert!(h.manager.get_prompt(&id).await.unwrap().is_some());
        assert!(
            h.events
                .lock()
                .unwrap()
                .iter()
                .any(|e| matches!(e, StateEvent::PromptAdded { .. }))
        );
    }
}
