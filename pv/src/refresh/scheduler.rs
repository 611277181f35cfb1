use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::flight::SingleFlight;
use crate::catalog::{CatalogFetcher, fetch_catalog};
use crate::domain::CacheMetadata;
use crate::effects::{PlatformEffects, ToastLevel};
use crate::state::{StateManager, StateResponse};

const FALLBACK_PERIOD: Duration = Duration::from_secs(60);

/// Scheduler tuning
#[derive(Debug, Clone, Default)]
pub struct RefreshConfig {
    /// Timer period; defaults to the persisted refresh interval
    pub tick_period: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Stopped,
    Idle,
    Refreshing,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another refresh was in flight
    Skipped,
    /// The interval has not elapsed; no network call was made
    Fresh,
    Disabled,
    Refreshed(usize),
    /// Fetch, parse or apply failed; the catalog is unchanged
    Failed,
}

/// Timer-driven refresh with a single-flight guard
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    manager: StateManager,
    fetcher: Arc<dyn CatalogFetcher>,
    effects: Arc<dyn PlatformEffects>,
    config: RefreshConfig,
    flight: SingleFlight,
    running: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(
        manager: StateManager,
        fetcher: Arc<dyn CatalogFetcher>,
        effects: Arc<dyn PlatformEffects>,
        config: RefreshConfig,
    ) -> Self {
        debug!(?config, "RefreshScheduler::new: called");
        Self {
            inner: Arc::new(Inner {
                manager,
                fetcher,
                effects,
                config,
                flight: SingleFlight::new(),
                running: AtomicBool::new(false),
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        if !self.inner.running.load(Ordering::SeqCst) {
            SchedulerPhase::Stopped
        } else if self.inner.flight.is_busy() {
            SchedulerPhase::Refreshing
        } else {
            SchedulerPhase::Idle
        }
    }

    /// Arm the timer using the persisted refresh settings
    ///
    /// When background refresh is disabled any armed timer is torn down.
    /// Calling it while running re-arms the timer.
    pub async fn start(&self) -> StateResponse<()> {
        debug!("start: called");
        let meta = self.inner.manager.cache_metadata().await?;
        if !meta.enabled {
            info!("background refresh disabled, scheduler not started");
            self.stop();
            return Ok(());
        }
        self.arm(self.period(&meta));
        Ok(())
    }

    /// Disarm the timer; an in-flight refresh still runs to completion
    pub fn stop(&self) {
        debug!("stop: called");
        self.inner.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.timer_slot().take() {
            handle.abort();
            info!("refresh scheduler stopped");
        }
    }

    /// Change the refresh interval, re-arming the timer if it is running
    pub async fn set_interval(&self, minutes: u32) -> StateResponse<CacheMetadata> {
        debug!(minutes, "set_interval: called");
        let meta = self
            .inner
            .manager
            .update_refresh_settings(Some(minutes), None)
            .await?;
        if self.inner.running.load(Ordering::SeqCst) {
            self.arm(self.period(&meta));
        }
        Ok(meta)
    }

    /// Enable or disable background refresh, starting or stopping the timer
    pub async fn set_enabled(&self, enabled: bool) -> StateResponse<CacheMetadata> {
        debug!(enabled, "set_enabled: called");
        let meta = self
            .inner
            .manager
            .update_refresh_settings(None, Some(enabled))
            .await?;
        if !enabled {
            self.stop();
        } else if !self.inner.running.load(Ordering::SeqCst) {
            self.arm(self.period(&meta));
        }
        Ok(meta)
    }

    /// One timer tick: refresh if the catalog is stale
    pub async fn tick(&self) -> TickOutcome {
        self.run(false).await
    }

    /// Refresh regardless of staleness and the enabled flag
    pub async fn refresh_now(&self) -> TickOutcome {
        self.run(true).await
    }

    async fn run(&self, force: bool) -> TickOutcome {
        debug!(force, "run: called");
        let Some(_guard) = self.inner.flight.try_acquire() else {
            debug!("run: refresh already in flight, skipping");
            return TickOutcome::Skipped;
        };
        let manager = &self.inner.manager;

        if !force {
            let meta = match manager.cache_metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(error = %e, "run: state unavailable");
                    return TickOutcome::Failed;
                }
            };
            if !meta.enabled {
                debug!("run: background refresh disabled");
                return TickOutcome::Disabled;
            }
            if !meta.is_due(Utc::now()) {
                debug!(last = ?meta.last_background_refresh, "run: catalog still fresh");
                return TickOutcome::Fresh;
            }
            if let Err(e) = manager.mark_stale().await {
                warn!(error = %e, "run: state unavailable");
                return TickOutcome::Failed;
            }
        }

        info!("refreshing catalog");
        let prompts = match fetch_catalog(self.inner.fetcher.as_ref()).await {
            Ok(prompts) => prompts,
            Err(e) => {
                warn!(error = %e, "refresh failed, keeping current catalog");
                return TickOutcome::Failed;
            }
        };

        let count = prompts.len();
        match manager.replace_catalog(prompts).await {
            Ok(meta) => {
                info!(count, version = %meta.data_version, "catalog refreshed");
                self.inner
                    .effects
                    .notify("Data updated in background", ToastLevel::Success);
                TickOutcome::Refreshed(count)
            }
            Err(e) => {
                warn!(error = %e, "refresh could not be applied");
                TickOutcome::Failed
            }
        }
    }

    fn period(&self, meta: &CacheMetadata) -> Duration {
        self.inner
            .config
            .tick_period
            .unwrap_or_else(|| meta.interval().to_std().unwrap_or(FALLBACK_PERIOD))
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.inner.timer.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn arm(&self, period: Duration) {
        debug!(?period, "arm: called");
        // The timer holds a weak reference so dropping every handle ends it
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let scheduler = RefreshScheduler { inner };
                // Each tick runs on its own task so stop() never cuts a refresh short
                tokio::spawn(async move {
                    let outcome = scheduler.tick().await;
                    debug!(?outcome, "timer tick finished");
                });
            }
        });

        self.inner.running.store(true, Ordering::SeqCst);
        if let Some(previous) = self.timer_slot().replace(handle) {
            previous.abort();
        }
        info!(?period, "refresh scheduler started");
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slot = match self.timer.get_mut() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}
