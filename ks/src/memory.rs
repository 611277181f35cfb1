//! In-memory byte store

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::store::{ByteStore, KvError, KvResult, validate_key};

/// Volatile store, used for ephemeral sessions and tests
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> KvResult<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| KvError::Unavailable("memory store poisoned".to_string()))
    }
}

impl ByteStore for MemoryStore {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> KvResult<()> {
        validate_key(key)?;
        self.entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> KvResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> KvResult<()> {
        self.entries()?.clear();
        Ok(())
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        Ok(self.entries()?.keys().cloned().collect())
    }
}
