use std::sync::Arc;

use kvstore::{ByteStore, KvError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Key holding the serialized AppState
pub const STATE_KEY: &str = "promptvault-state";

/// Errors surfaced by `PersistentStore::save`
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] KvError),
}

/// Typed view over a shared byte store
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn ByteStore>,
}

impl PersistentStore {
    pub fn new(backend: Arc<dyn ByteStore>) -> Self {
        Self { backend }
    }

    /// Read and decode `key`
    ///
    /// Returns `None` when the key is absent, when the backend cannot be read,
    /// or when the stored bytes do not decode. Undecodable entries are removed.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        debug!(%key, "load: called");
        let bytes = match self.backend.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(%key, "load: key absent");
                return None;
            }
            Err(e) => {
                warn!(%key, error = %e, "load: backend read failed, treating as absent");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%key, error = %e, len = bytes.len(), "load: stored value is corrupt, removing");
                if let Err(e) = self.backend.delete(key) {
                    warn!(%key, error = %e, "load: failed to remove corrupt value");
                }
                None
            }
        }
    }

    /// Encode and write `value` under `key`
    ///
    /// Backend failures are logged here and returned; there is no retry.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        debug!(%key, "save: called");
        let bytes = serde_json::to_vec(value)?;
        self.backend.put(key, &bytes).map_err(|e| {
            warn!(%key, error = %e, "save: backend write failed");
            StoreError::Backend(e)
        })
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        debug!(%key, "remove: called");
        Ok(self.backend.delete(key)?)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        debug!("clear: called");
        Ok(self.backend.clear()?)
    }

    /// Whether `key` holds a value; an unreadable backend reads as false
    pub fn exists(&self, key: &str) -> bool {
        self.backend.contains(key).unwrap_or_else(|e| {
            warn!(%key, error = %e, "exists: backend read failed");
            false
        })
    }
}
