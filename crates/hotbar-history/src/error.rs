//! Error types for history and storage
//!
//! Store errors never escape [`crate::PersistenceSync`]; they are logged and
//! absorbed there. They are public so that store implementations can report
//! them.

use crate::entry::ResultId;
use crate::store::StorageKey;
use std::path::PathBuf;

/// Errors from a key-value store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Write would exceed the store's byte quota
    #[error("quota exceeded writing {key}: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        key: StorageKey,
        needed: usize,
        quota: usize,
    },

    /// IO error on a file-backed store
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from history navigation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// Id is in neither the recent nor the pinned cache
    #[error("no cached result with id {0}")]
    UnknownResult(ResultId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_display() {
        let err = StoreError::QuotaExceeded {
            key: StorageKey::History,
            needed: 10,
            quota: 4,
        };
        assert_eq!(
            err.to_string(),
            "quota exceeded writing hotbar.history: 10 bytes needed, 4 allowed"
        );
    }

    #[test]
    fn unknown_result_display() {
        let err = HistoryError::UnknownResult(ResultId::from_raw(17));
        assert_eq!(err.to_string(), "no cached result with id 17");
    }
}
