//! Hotbar History
//!
//! Bounded recent and pinned result caches, the active-result selector, and
//! write-through persistence of the whole session snapshot.
//!
//! # Core Concepts
//!
//! - [`ResultEntry`]: Immutable rendered result with its source hotbar
//! - [`ResultCache`]: Newest-first cache with strict oldest-out eviction
//! - [`History`]: Recent plus pinned caches and the active id
//! - [`KvStore`]: Four-slot string store ([`MemoryStore`], [`FileStore`])
//! - [`PersistenceSync`]: Encodes and restores snapshots, absorbing failures
//!
//! # Example
//!
//! ```rust
//! use hotbar_history::{History, ResultEntry, ResultIdGenerator};
//! use hotbar_model::SlotAssignment;
//!
//! let ids = ResultIdGenerator::new();
//! let mut history = History::new(20, 20);
//! let entry = history.record(ResultEntry::new(
//!     ids.next_id(),
//!     vec![0x89, b'P', b'N', b'G'],
//!     Vec::new(),
//!     SlotAssignment::new(9),
//! ));
//! history.toggle_pin(entry.id()).unwrap();
//! assert!(history.is_pinned(entry.id()));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod cache;
mod entry;
mod error;
mod history;
mod persist;
mod store;

pub use cache::{CacheStats, PinState, ResultCache, DEFAULT_CAPACITY};
pub use entry::{Artifact, ResultEntry, ResultId, ResultIdGenerator};
pub use error::{HistoryError, StoreError};
pub use history::History;
pub use persist::{
    CacheLimits, ChangeSet, FormState, PersistedSnapshot, PersistenceSync, SaveReport,
};
pub use store::{FileStore, KvStore, MemoryStore, StorageKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ChangeSet, FormState, History, KvStore, PersistenceSync, ResultEntry, ResultId,
        StorageKey,
    };
}
