//! # Local Storage
//!
//! A string key-value store with the same surface as a browser's local
//! storage: `get_item`, `set_item`, `remove_item`.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storage trait                                   │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌──────────────────────────────────┐  │
//! │  │   MemoryStorage      │        │   FileStorage                    │  │
//! │  │                      │        │                                  │  │
//! │  │  Mutex<BTreeMap>     │        │  Mutex<BTreeMap> mirrored to     │  │
//! │  │  counts writes       │        │  one JSON object file:           │  │
//! │  │  (tests, previews)   │        │  {"cart": "[{\"id\":1,...}]"}     │  │
//! │  └──────────────────────┘        └──────────────────────────────────┘  │
//! │                                                                         │
//! │  Every write is a full replace of the value under its key.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::StorageError;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Synchronous string key-value storage.
pub trait Storage: Send + Sync {
    /// Returns the value under `key`, or `None` if the key is absent.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replaces the value under `key`.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes `key`. Deleting an absent key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<T: Storage + ?Sized> Storage for Arc<T> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Memory Storage
// =============================================================================

/// In-memory storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a value without counting it as a write.
    pub fn with_item(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        lock(&self.items).insert(key.into(), value.into());
        self
    }

    /// Number of `set_item` and `remove_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        lock(&self.items).insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        lock(&self.items).remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// File Storage
// =============================================================================

/// Storage persisted to a single JSON object file.
///
/// ## Write Path
/// The whole map is written to `<path>.tmp` and renamed over `path`, so a
/// crash mid-write leaves the previous file intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens (or prepares to create) the storage file at `path`.
    ///
    /// A missing file is an empty storage; the parent directory is created
    /// so the first write succeeds.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let items = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = items.len(), "Opened file storage");

        Ok(FileStorage {
            path,
            items: Mutex::new(items),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> StorageResult<()> {
        let text = serde_json::to_string(items).map_err(StorageError::Encode)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text.as_bytes())?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = lock(&self.items);
        let previous = items.insert(key.to_string(), value.to_string());

        if let Err(e) = self.flush(&items) {
            // keep memory and disk in agreement
            match previous {
                Some(previous) => items.insert(key.to_string(), previous),
                None => items.remove(key),
            };
            return Err(e);
        }

        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = lock(&self.items);
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.flush(&items) {
            items.insert(key.to_string(), previous);
            return Err(e);
        }

        Ok(())
    }
}
