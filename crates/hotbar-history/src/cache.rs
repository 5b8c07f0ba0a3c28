//! Bounded, ordered result cache
//!
//! Newest entry first. Inserting past capacity drops the oldest entry.
//! Identity is the entry id; an id appears at most once per cache.

use crate::entry::{ResultEntry, ResultId};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default capacity for both the recent and pinned caches
pub const DEFAULT_CAPACITY: usize = 20;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: usize,
    /// Maximum number of entries
    pub capacity: usize,
}

/// Outcome of toggling pin membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinState {
    Pinned,
    Unpinned,
}

/// Most-recent-first bounded cache
#[derive(Debug, Clone)]
pub struct ResultCache {
    entries: VecDeque<Arc<ResultEntry>>,
    capacity: usize,
}

impl ResultCache {
    /// Create empty cache; capacity is at least 1
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build cache from entries listed newest first
    ///
    /// Later duplicates of an id and entries past capacity are dropped.
    #[must_use]
    pub fn from_entries<I>(capacity: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = Arc<ResultEntry>>,
    {
        let mut cache = Self::new(capacity);
        for entry in entries {
            if cache.entries.len() == cache.capacity {
                break;
            }
            if !cache.contains(entry.id()) {
                cache.entries.push_back(entry);
            }
        }
        cache
    }

    /// Prepend entry, returning the evicted tail if capacity was exceeded
    ///
    /// An entry whose id is already cached moves to the front instead of
    /// being duplicated.
    pub fn insert(&mut self, entry: Arc<ResultEntry>) -> Option<Arc<ResultEntry>> {
        self.remove(entry.id());
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            let evicted = self.entries.pop_back();
            if let Some(evicted) = &evicted {
                tracing::debug!(id = %evicted.id(), "evicted result from cache");
            }
            evicted
        } else {
            None
        }
    }

    /// Remove entry by id; no-op if absent
    pub fn remove(&mut self, id: ResultId) -> Option<Arc<ResultEntry>> {
        let position = self.entries.iter().position(|e| e.id() == id)?;
        self.entries.remove(position)
    }

    /// Pin-style toggle: remove if present, otherwise insert
    pub fn toggle(&mut self, entry: Arc<ResultEntry>) -> PinState {
        if self.remove(entry.id()).is_some() {
            PinState::Unpinned
        } else {
            self.insert(entry);
            PinState::Pinned
        }
    }

    /// Check if cache holds id
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ResultId) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    /// Get entry by id
    #[must_use]
    pub fn get(&self, id: ResultId) -> Option<&Arc<ResultEntry>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Newest entry
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&Arc<ResultEntry>> {
        self.entries.front()
    }

    /// Entries newest first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResultEntry>> {
        self.entries.iter()
    }

    /// Ids newest first
    #[must_use]
    pub fn ids(&self) -> Vec<ResultId> {
        self.entries.iter().map(|e| e.id()).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            capacity: self.capacity,
        }
    }
}

impl Default for ResultCache {
    /// Create cache with default capacity (20 entries)
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
