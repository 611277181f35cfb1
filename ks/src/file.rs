//! Directory-backed byte store
//!
//! One file per key. Writes go to a temp file and are renamed into place so a
//! reader never sees a partial value; an advisory `fs2` lock on `.lock`
//! serializes writers across processes.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use crate::VALUE_EXTENSION;
use crate::store::{ByteStore, KvError, KvResult, validate_key};

const LOCK_FILE: &str = ".lock";

/// Held for the duration of one store operation
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Byte store persisting each key as a file under a base directory
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Open or create a store rooted at `path`
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| KvError::Unavailable(format!("{}: {}", base_path.display(), e)))?;
        info!(base_path = %base_path.display(), "Opened file store");
        Ok(Self { base_path })
    }

    /// Root directory of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", key, VALUE_EXTENSION))
    }

    fn lock(&self, exclusive: bool) -> KvResult<LockGuard> {
        let path = self.base_path.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| KvError::Lock(format!("{}: {}", path.display(), e)))?;
        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|e| KvError::Lock(e.to_string()))?;
        Ok(LockGuard { file })
    }
}

impl ByteStore for FileStore {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        debug!(%key, "FileStore::get: called");
        validate_key(key)?;
        let _guard = self.lock(false)?;
        match fs::read(self.value_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%key, "FileStore::get: key absent");
                Ok(None)
            }
            Err(source) => Err(KvError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> KvResult<()> {
        debug!(%key, len = value.len(), "FileStore::put: called");
        validate_key(key)?;
        let _guard = self.lock(true)?;
        let path = self.value_path(key);
        let temp_path = path.with_extension("tmp");
        let io_err = |source| KvError::Io {
            key: key.to_string(),
            source,
        };
        fs::write(&temp_path, value).map_err(io_err)?;
        fs::rename(&temp_path, &path).map_err(io_err)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> KvResult<()> {
        debug!(%key, "FileStore::delete: called");
        validate_key(key)?;
        let _guard = self.lock(true)?;
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(KvError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn clear(&self) -> KvResult<()> {
        debug!("FileStore::clear: called");
        let keys = self.keys()?;
        let _guard = self.lock(true)?;
        for key in &keys {
            match fs::remove_file(self.value_path(key)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(KvError::Io {
                        key: key.clone(),
                        source,
                    });
                }
            }
        }
        info!(count = keys.len(), "Cleared file store");
        Ok(())
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| KvError::Unavailable(format!("{}: {}", self.base_path.display(), e)))?;
        let mut keys: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == VALUE_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
