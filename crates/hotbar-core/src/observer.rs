//! State change subscribers

use crate::state::SessionState;
use hotbar_history::{ChangeSet, PersistenceSync};

/// Receives every committed state change
///
/// Called with the session lock held, so implementations must not call back
/// into the controller.
#[cfg_attr(test, mockall::automock)]
pub trait StateObserver: Send + Sync {
    fn state_changed(&self, state: &SessionState, changes: ChangeSet);
}

/// Write-through persistence: every change is saved immediately
impl StateObserver for PersistenceSync {
    fn state_changed(&self, state: &SessionState, changes: ChangeSet) {
        let report = self.save(&state.history, &state.form, changes);
        if !report.is_clean() {
            tracing::debug!(failed = ?report.failed, "snapshot partially saved");
        }
    }
}
