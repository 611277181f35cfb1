//! ByteStore trait and errors

use thiserror::Error;

/// Errors from byte store operations
#[derive(Debug, Error)]
pub enum KvError {
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("I/O error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type KvResult<T> = Result<T, KvError>;

/// Synchronous key-value byte store
///
/// Implementations must be safe to share between threads. Callers are expected
/// to serialize logical writers themselves; the store only guarantees that a
/// single `put` is never observed half-written.
pub trait ByteStore: Send + Sync {
    /// Read the bytes stored under `key`, `None` if absent
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: &[u8]) -> KvResult<()>;

    /// Remove `key`; removing an absent key is not an error
    fn delete(&self, key: &str) -> KvResult<()>;

    /// Remove every key
    fn clear(&self) -> KvResult<()>;

    /// List stored keys in sorted order
    fn keys(&self) -> KvResult<Vec<String>>;

    /// Whether `key` currently holds a value
    fn contains(&self, key: &str) -> KvResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Keys double as file names, so they are restricted to a portable alphabet
pub fn validate_key(key: &str) -> KvResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key.len() <= 200
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(KvError::InvalidKey(key.to_string()))
    }
}
