//! Durable key-value storage
//!
//! Four independent string slots hold the snapshot. Stores report failures
//! synchronously; callers decide whether to absorb them.

use crate::error::StoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Snapshot slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Recent results
    History,
    /// Pinned results
    Pinned,
    /// Slot assignment and selections
    Form,
    /// Active result id
    Active,
}

impl StorageKey {
    /// Every key, in restoration order
    pub const ALL: [Self; 4] = [Self::History, Self::Pinned, Self::Form, Self::Active];

    /// Stable storage name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::History => "hotbar.history",
            Self::Pinned => "hotbar.pinned",
            Self::Form => "hotbar.form",
            Self::Active => "hotbar.active",
        }
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String-keyed blob store
#[cfg_attr(test, mockall::automock)]
pub trait KvStore: Send + Sync {
    /// Read a slot; `Ok(None)` when it was never written
    ///
    /// # Errors
    /// Store specific read failure.
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError>;

    /// Overwrite a slot
    ///
    /// # Errors
    /// Store specific write failure, e.g. `StoreError::QuotaExceeded`.
    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError>;
}

/// In-process store with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<StorageKey, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create unbounded store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store whose slots together may hold at most `bytes`
    #[inline]
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            slots: Mutex::default(),
            quota: Some(bytes),
        }
    }

    /// Total stored bytes
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.slots.lock().values().map(String::len).sum()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.slots.lock().get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.lock();
        if let Some(quota) = self.quota {
            let others: usize = slots
                .iter()
                .filter(|(k, _)| **k != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { key, needed, quota });
            }
        }
        slots.insert(key, value.to_owned());
        Ok(())
    }
}

/// Directory-backed store, one `<key>.json` file per slot
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open store rooted at `root`, creating the directory if needed
    ///
    /// # Errors
    /// - `StoreError::Io` if the directory cannot be created
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io_error(&root, e))?;
        Ok(Self { root })
    }

    /// Store directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a slot
    #[must_use]
    pub fn path_for(&self, key: StorageKey) -> PathBuf {
        self.root.join(format!("{}.json", key.as_str()))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io_error(path, e)),
        }
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(|e| StoreError::io_error(&staging, e))?;
        fs::rename(&staging, &path).map_err(|e| StoreError::io_error(&path, e))
    }
}
