//! Write-through snapshot persistence
//!
//! Saving is advisory: a failed write is logged and the in-memory state stays
//! authoritative. Loading never fails: each slot, and each field inside the
//! form slot, falls back to its default on its own.

use crate::cache::ResultCache;
use crate::entry::{ResultEntry, ResultId};
use crate::history::History;
use crate::store::{KvStore, StorageKey};
use hotbar_model::{ColorId, Dimensions, SlotAssignment, WeightMode, DEFAULT_SLOT_COUNT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

/// Editable session state persisted under [`StorageKey::Form`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub assignment: SlotAssignment,
    /// Subset selection used as the randomizer pool
    pub pool_selection: Vec<ColorId>,
    /// Colors forced to the front of randomized hotbars
    pub lock_selection: Vec<ColorId>,
    pub weight_mode: WeightMode,
    pub dimensions: Dimensions,
}

impl FormState {
    /// Empty form with `slot_count` slots
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Self {
            assignment: SlotAssignment::new(slot_count),
            pool_selection: Vec::new(),
            lock_selection: Vec::new(),
            weight_mode: WeightMode::default(),
            dimensions: Dimensions::default(),
        }
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}

/// Which snapshot slots an operation touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChangeSet {
    pub form: bool,
    pub recent: bool,
    pub pinned: bool,
    pub active: bool,
}

impl ChangeSet {
    /// Nothing changed
    pub const NONE: Self = Self {
        form: false,
        recent: false,
        pinned: false,
        active: false,
    };

    /// Everything changed
    pub const ALL: Self = Self {
        form: true,
        recent: true,
        pinned: true,
        active: true,
    };

    /// Only the form changed
    pub const FORM: Self = Self {
        form: true,
        ..Self::NONE
    };

    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }

    /// Storage keys to rewrite
    #[must_use]
    pub fn keys(self) -> Vec<StorageKey> {
        StorageKey::ALL
            .into_iter()
            .filter(|key| match key {
                StorageKey::History => self.recent,
                StorageKey::Pinned => self.pinned,
                StorageKey::Form => self.form,
                StorageKey::Active => self.active,
            })
            .collect()
    }
}

impl BitOr for ChangeSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            form: self.form || rhs.form,
            recent: self.recent || rhs.recent,
            pinned: self.pinned || rhs.pinned,
            active: self.active || rhs.active,
        }
    }
}

impl BitOrAssign for ChangeSet {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// Capacities used when rebuilding caches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub recent: usize,
    pub pinned: usize,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            recent: crate::cache::DEFAULT_CAPACITY,
            pinned: crate::cache::DEFAULT_CAPACITY,
        }
    }
}

/// Decoded snapshot
#[derive(Debug, Clone)]
pub struct PersistedSnapshot {
    pub history: History,
    pub form: FormState,
}

/// Keys written and keys that failed during one save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub written: Vec<StorageKey>,
    pub failed: Vec<StorageKey>,
}

impl SaveReport {
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Synchronizes history and form state with a [`KvStore`]
#[derive(Clone)]
pub struct PersistenceSync {
    store: Arc<dyn KvStore>,
    limits: CacheLimits,
}

impl std::fmt::Debug for PersistenceSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceSync")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl PersistenceSync {
    /// Create sync over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, limits: CacheLimits) -> Self {
        Self { store, limits }
    }

    /// Cache capacities used by [`Self::load`]
    #[inline]
    #[must_use]
    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    /// Write every slot
    pub fn save_all(&self, history: &History, form: &FormState) -> SaveReport {
        self.save(history, form, ChangeSet::ALL)
    }

    /// Write the slots named by `changes`
    ///
    /// Failures are logged and reported, never raised.
    pub fn save(&self, history: &History, form: &FormState, changes: ChangeSet) -> SaveReport {
        let mut report = SaveReport::default();
        for key in changes.keys() {
            let encoded = match key {
                StorageKey::History => encode_cache(history.recent()),
                StorageKey::Pinned => encode_cache(history.pinned()),
                StorageKey::Form => serde_json::to_string(form),
                StorageKey::Active => serde_json::to_string(&history.active_id()),
            };

            let outcome = match encoded {
                Ok(value) => self.store.set(key, &value).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(()) => report.written.push(key),
                Err(error) => {
                    tracing::warn!(%key, %error, "failed to persist snapshot slot");
                    report.failed.push(key);
                }
            }
        }
        report
    }

    /// Read and decode the last snapshot
    ///
    /// Missing or malformed data degrades to `defaults` (form fields) or to
    /// empty caches and no active id. Restoration order: caches, then form,
    /// then the active id.
    #[must_use]
    pub fn load(&self, defaults: &FormState) -> PersistedSnapshot {
        let recent = ResultCache::from_entries(
            self.limits.recent,
            self.decode_entries(StorageKey::History),
        );
        let pinned = ResultCache::from_entries(
            self.limits.pinned,
            self.decode_entries(StorageKey::Pinned),
        );

        let form = self.decode_form(defaults);

        let preferred = self
            .read_json(StorageKey::Active)
            .and_then(|value| decode_value::<Option<ResultId>>(StorageKey::Active, value))
            .flatten();
        let history = History::restore(recent, pinned, preferred);

        tracing::info!(
            recent = history.recent().len(),
            pinned = history.pinned().len(),
            active = ?history.active_id(),
            "restored snapshot"
        );
        PersistedSnapshot { history, form }
    }

    fn read_json(&self, key: StorageKey) -> Option<Value> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(%key, %error, "failed to read snapshot slot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%key, %error, "snapshot slot is not valid JSON");
                None
            }
        }
    }

    fn decode_entries(&self, key: StorageKey) -> Vec<Arc<ResultEntry>> {
        let items = match self.read_json(key) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                tracing::warn!(%key, "snapshot slot is not a list");
                return Vec::new();
            }
            None => return Vec::new(),
        };
        items
            .into_iter()
            .filter_map(|item| decode_value::<ResultEntry>(key, item))
            .map(Arc::new)
            .collect()
    }

    fn decode_form(&self, defaults: &FormState) -> FormState {
        let object = match self.read_json(StorageKey::Form) {
            Some(Value::Object(object)) => object,
            Some(_) => {
                tracing::warn!(key = %StorageKey::Form, "snapshot slot is not an object");
                return defaults.clone();
            }
            None => return defaults.clone(),
        };

        let slot_count = defaults.assignment.len();
        FormState {
            assignment: form_field::<SlotAssignment>(&object, "assignment")
                .map_or_else(|| defaults.assignment.clone(), |a| a.normalized(slot_count)),
            pool_selection: form_field(&object, "pool_selection")
                .unwrap_or_else(|| defaults.pool_selection.clone()),
            lock_selection: form_field(&object, "lock_selection")
                .unwrap_or_else(|| defaults.lock_selection.clone()),
            weight_mode: form_field(&object, "weight_mode").unwrap_or(defaults.weight_mode),
            dimensions: form_field::<Dimensions>(&object, "dimensions")
                .map_or(defaults.dimensions, Dimensions::clamped),
        }
    }
}

fn encode_cache(cache: &ResultCache) -> serde_json::Result<String> {
    let entries: Vec<&ResultEntry> = cache.iter().map(|entry| &**entry).collect();
    serde_json::to_string(&entries)
}

fn decode_value<T: DeserializeOwned>(key: StorageKey, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(error) => {
            tracing::warn!(%key, %error, "dropping malformed snapshot value");
            None
        }
    }
}

fn form_field<T: DeserializeOwned>(object: &Map<String, Value>, name: &str) -> Option<T> {
    let value = object.get(name)?.clone();
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(error) => {
            tracing::warn!(field = name, %error, "dropping malformed form field");
            None
        }
    }
}
