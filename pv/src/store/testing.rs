//! Byte store doubles for unit tests

use std::sync::atomic::{AtomicBool, Ordering};

use kvstore::{ByteStore, KvError, KvResult, MemoryStore};

/// Wraps a MemoryStore and fails every write while `failing` is set
pub struct FailingStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: AtomicBool::new(true),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> KvResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(KvError::Unavailable("quota exceeded".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ByteStore for FailingStore {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> KvResult<()> {
        self.check()?;
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> KvResult<()> {
        self.check()?;
        self.inner.delete(key)
    }

    fn clear(&self) -> KvResult<()> {
        self.check()?;
        self.inner.clear()
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        self.inner.keys()
    }
}
