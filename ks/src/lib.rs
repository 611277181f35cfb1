//! KvStore - key-value byte store for PromptVault
//!
//! A minimal `get/put/delete/clear` substrate that the PromptVault core
//! persists its state into. Values are opaque bytes; callers own the encoding.
//!
//! # Layout
//!
//! ```text
//! ~/.local/share/promptvault/store/
//! ├── .lock                      # advisory lock (fs2) serializing writers
//! ├── promptvault-state.kv       # one file per key
//! └── ...
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kvstore::{ByteStore, FileStore};
//!
//! let store = FileStore::open("/tmp/pv-store")?;
//! store.put("greeting", b"hello")?;
//! assert_eq!(store.get("greeting")?, Some(b"hello".to_vec()));
//! ```

pub mod cli;
pub mod config;
mod file;
mod memory;
mod store;

use std::path::PathBuf;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{ByteStore, KvError, KvResult, validate_key};

/// File extension used for stored values
pub const VALUE_EXTENSION: &str = "kv";

/// Default on-disk location shared by `ks` and `pv`
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptvault")
        .join("store")
}
