use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::types::StateEvent;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

type Handler = Arc<dyn Fn(&StateEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to detach the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Multi-subscriber change channel
pub struct StateNotifier {
    handlers: Mutex<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<StateEvent>,
}

impl StateNotifier {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "StateNotifier::new: called");
        let (tx, _) = broadcast::channel(capacity);
        Self {
            handlers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            tx,
        }
    }

    /// Attach a handler that runs synchronously on every publish
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StateEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.handlers.lock() {
            Ok(mut handlers) => handlers.push((id, Arc::new(handler))),
            Err(poisoned) => poisoned.into_inner().push((id, Arc::new(handler))),
        }
        debug!(subscription = id.0, "StateNotifier::subscribe: attached");
        id
    }

    /// Detach a handler; returns false if it was not attached
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = match self.handlers.lock() {
            Ok(handlers) => handlers,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = handlers.len();
        handlers.retain(|(sid, _)| *sid != id);
        let removed = handlers.len() != before;
        debug!(subscription = id.0, removed, "StateNotifier::unsubscribe: called");
        removed
    }

    /// Receiver for async consumers; sees events published after this call
    pub fn receiver(&self) -> broadcast::Receiver<StateEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        let handlers = match self.handlers.lock() {
            Ok(handlers) => handlers.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        handlers + self.tx.receiver_count()
    }

    /// Deliver `event` to every handler, then to the broadcast channel
    pub fn publish(&self, event: StateEvent) {
        debug!(event_type = event.event_type(), "StateNotifier::publish");
        // Snapshot so handlers may subscribe or unsubscribe while running
        let handlers: Vec<(SubscriptionId, Handler)> = match self.handlers.lock() {
            Ok(handlers) => handlers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        for (id, handler) in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                warn!(subscription = id.0, event_type = event.event_type(), "subscriber panicked, skipping");
            }
        }

        // No receivers is fine
        let _ = self.tx.send(event);
    }
}

impl Default for StateNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
