//! PersistentStore - typed JSON persistence over a byte store
//!
//! Wraps any `kvstore::ByteStore` and adds serde encoding plus corruption
//! recovery: a value that no longer deserializes is deleted and reported as
//! absent, so the caller falls back to defaults.

mod persistent;

pub use persistent::{PersistentStore, STATE_KEY, StoreError};

#[cfg(test)]
pub(crate) mod testing;
