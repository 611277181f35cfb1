use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Capacity-1 guard around the refresh body
#[derive(Debug, Clone)]
pub struct SingleFlight {
    permits: Arc<Semaphore>,
}

/// Held for the duration of one refresh; releases on drop
#[derive(Debug)]
pub struct FlightGuard {
    _permit: OwnedSemaphorePermit,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Take the slot if it is free; `None` while another refresh holds it
    pub fn try_acquire(&self) -> Option<FlightGuard> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| FlightGuard { _permit: permit })
    }

    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}
