//! Recent and pinned caches plus the active selector
//!
//! The two caches evolve independently once an entry is in both: pinning
//! never removes from `recent`, and falling out of `recent` never unpins.
//! The active id always resolves in one of the caches or is `None`.

use crate::cache::{PinState, ResultCache, DEFAULT_CAPACITY};
use crate::entry::{ResultEntry, ResultId};
use crate::error::HistoryError;
use std::sync::Arc;

/// Result history for one session
#[derive(Debug, Clone)]
pub struct History {
    recent: ResultCache,
    pinned: ResultCache,
    active: Option<ResultId>,
}

impl History {
    /// Create empty history
    #[inline]
    #[must_use]
    pub fn new(recent_capacity: usize, pinned_capacity: usize) -> Self {
        Self {
            recent: ResultCache::new(recent_capacity),
            pinned: ResultCache::new(pinned_capacity),
            active: None,
        }
    }

    /// Rebuild history from restored caches
    ///
    /// The active id is `preferred` if it still resolves, else the newest
    /// recent entry, else `None`.
    #[must_use]
    pub fn restore(recent: ResultCache, pinned: ResultCache, preferred: Option<ResultId>) -> Self {
        let mut history = Self {
            recent,
            pinned,
            active: preferred,
        };
        history.repair_active();
        history
    }

    #[inline]
    #[must_use]
    pub fn recent(&self) -> &ResultCache {
        &self.recent
    }

    #[inline]
    #[must_use]
    pub fn pinned(&self) -> &ResultCache {
        &self.pinned
    }

    /// Id of the displayed entry
    #[inline]
    #[must_use]
    pub fn active_id(&self) -> Option<ResultId> {
        self.active
    }

    /// Displayed entry
    #[must_use]
    pub fn active(&self) -> Option<&Arc<ResultEntry>> {
        self.active.and_then(|id| self.resolve(id))
    }

    /// Look an id up in recent, then pinned
    #[must_use]
    pub fn resolve(&self, id: ResultId) -> Option<&Arc<ResultEntry>> {
        self.recent.get(id).or_else(|| self.pinned.get(id))
    }

    /// Check if id is pinned
    #[inline]
    #[must_use]
    pub fn is_pinned(&self, id: ResultId) -> bool {
        self.pinned.contains(id)
    }

    /// Highest id held in either cache
    #[must_use]
    pub fn max_id(&self) -> Option<ResultId> {
        self.recent.iter().chain(self.pinned.iter()).map(|e| e.id()).max()
    }

    /// Add a new result to `recent` and make it active
    pub fn record(&mut self, entry: ResultEntry) -> Arc<ResultEntry> {
        let entry = Arc::new(entry);
        self.recent.insert(Arc::clone(&entry));
        self.active = Some(entry.id());
        entry
    }

    /// Make a cached result active
    ///
    /// # Errors
    /// - `HistoryError::UnknownResult` if the id is in neither cache
    pub fn select(&mut self, id: ResultId) -> Result<Arc<ResultEntry>, HistoryError> {
        let entry = self
            .resolve(id)
            .cloned()
            .ok_or(HistoryError::UnknownResult(id))?;
        self.active = Some(id);
        Ok(entry)
    }

    /// Pin a cached result, or unpin it if already pinned
    ///
    /// Unpinning an entry that already left `recent` drops it entirely; the
    /// active id then falls back to the newest recent entry.
    ///
    /// # Errors
    /// - `HistoryError::UnknownResult` if the id is in neither cache
    pub fn toggle_pin(&mut self, id: ResultId) -> Result<PinState, HistoryError> {
        let entry = self
            .resolve(id)
            .cloned()
            .ok_or(HistoryError::UnknownResult(id))?;
        let state = self.pinned.toggle(entry);
        self.repair_active();
        Ok(state)
    }

    fn repair_active(&mut self) {
        let resolves = self.active.is_some_and(|id| self.resolve(id).is_some());
        if !resolves {
            let fallback = self.recent.latest().map(|e| e.id());
            if self.active.is_some() {
                tracing::debug!(
                    stale = ?self.active,
                    fallback = ?fallback,
                    "active result no longer cached"
                );
            }
            self.active = fallback;
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_CAPACITY)
    }
}
