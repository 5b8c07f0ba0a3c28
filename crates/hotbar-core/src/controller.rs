//! Session controller
//!
//! Owns the session state behind one mutex and orchestrates randomize,
//! generate, restore, and pin against the renderer and the observers.
//!
//! # Concurrency
//!
//! The state lock is never held across the renderer await. Concurrent
//! generates therefore render in parallel and land in `recent` in response
//! order.

use crate::config::HotbarConfig;
use crate::error::SessionError;
use crate::observer::StateObserver;
use crate::randomizer::Randomizer;
use crate::state::{Action, SessionState};
use hotbar_history::{
    ChangeSet, HistoryError, KvStore, PersistenceSync, PinState, ResultEntry, ResultId,
    ResultIdGenerator,
};
use hotbar_model::{ColorId, Palette, SlotAssignment};
use hotbar_render::{RenderRequest, Renderer};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Where randomize draws its pool from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PoolSource {
    /// Every palette color
    #[default]
    Palette,
    /// The subset selection
    Subset,
}

/// Orchestrates one editing session
pub struct SessionController {
    config: HotbarConfig,
    palette: Palette,
    renderer: Arc<dyn Renderer>,
    randomizer: Randomizer,
    state: Mutex<SessionState>,
    rng: Mutex<StdRng>,
    ids: ResultIdGenerator,
    observers: Vec<Arc<dyn StateObserver>>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("randomizer", &self.randomizer)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Create controller with fresh in-memory state and the dye palette
    #[must_use]
    pub fn new(config: HotbarConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            palette: Palette::dyes(),
            randomizer: Randomizer::from_config(&config),
            state: Mutex::new(SessionState::new(&config)),
            rng: Mutex::new(StdRng::from_os_rng()),
            ids: ResultIdGenerator::new(),
            observers: Vec::new(),
            renderer,
            config,
        }
    }

    /// Create controller restored from `store` that writes every change back
    #[must_use]
    pub fn open(config: HotbarConfig, renderer: Arc<dyn Renderer>, store: Arc<dyn KvStore>) -> Self {
        Self::new(config, renderer).with_persistence(store)
    }

    /// With palette; colors outside it are dropped from the state
    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.state.get_mut().sanitize(&palette);
        self.palette = palette;
        self
    }

    /// With deterministic randomness
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// With an additional state observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Restore state from `store` and subscribe write-through persistence
    #[must_use]
    pub fn with_persistence(self, store: Arc<dyn KvStore>) -> Self {
        let sync = PersistenceSync::new(store, self.config.cache_limits());
        let snapshot = sync.load(&SessionState::default_form(&self.config));
        let state = SessionState::from_snapshot(snapshot, &self.palette);
        let mut controller = Self {
            ids: ResultIdGenerator::starting_after(state.history.max_id()),
            state: Mutex::new(state),
            ..self
        };
        controller.observers.push(Arc::new(sync));
        controller
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &HotbarConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// Read the state under the lock
    pub fn inspect<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        f(&self.state.lock())
    }

    /// Apply one action and notify observers
    ///
    /// # Errors
    /// See [`SessionState::dispatch`].
    pub fn dispatch(&self, action: Action) -> Result<ChangeSet, SessionError> {
        let mut state = self.state.lock();
        let changes = state.dispatch(action, &self.palette)?;
        self.notify(&state, changes);
        Ok(changes)
    }

    /// Render the current hotbar and record the result
    ///
    /// # Errors
    /// - `SessionError::NoChoices` if no slot has a color and positive weight
    /// - `SessionError::Render` if the renderer fails; nothing is recorded
    pub async fn generate(&self) -> Result<Arc<ResultEntry>, SessionError> {
        let (source, request) = Self::render_input(&self.state.lock())?;
        self.render_and_record(source, request).await
    }

    /// Randomize the hotbar from `source` and the locks, then generate
    ///
    /// The randomized hotbar is the one rendered, even if other calls change
    /// the state before the render completes. The state is untouched if
    /// randomization fails. A render failure leaves the randomized hotbar in
    /// place.
    ///
    /// # Errors
    /// - `SessionError::Randomize` for bad selections or no varied result
    /// - see [`Self::generate`]
    pub async fn randomize(&self, source: PoolSource) -> Result<Arc<ResultEntry>, SessionError> {
        let (source, request) = {
            let mut state = self.state.lock();
            let pool: Vec<ColorId> = match source {
                PoolSource::Palette => self.palette.ids().cloned().collect(),
                PoolSource::Subset => state.form.pool_selection.clone(),
            };
            let assignment = self.randomizer.randomize(
                &pool,
                &state.form.lock_selection,
                state.slot_count(),
                &mut *self.rng.lock(),
            )?;
            let changes = state.dispatch(Action::ApplyAssignment(assignment), &self.palette)?;
            self.notify(&state, changes);
            Self::render_input(&state)?
        };
        self.render_and_record(source, request).await
    }

    /// Source hotbar and render request for the current form
    fn render_input(state: &SessionState) -> Result<(SlotAssignment, RenderRequest), SessionError> {
        let choices = state.form.assignment.choices();
        if choices.is_empty() {
            return Err(SessionError::NoChoices);
        }
        Ok((
            state.form.assignment.clone(),
            RenderRequest::new(choices, state.form.dimensions),
        ))
    }

    /// Render `request` without holding the state lock, then record the result
    async fn render_and_record(
        &self,
        source: SlotAssignment,
        request: RenderRequest,
    ) -> Result<Arc<ResultEntry>, SessionError> {
        tracing::debug!(choices = request.choices.len(), "requesting render");
        let response = self.renderer.render(request).await.map_err(|e| {
            tracing::warn!(error = %e, "render failed");
            e
        })?;

        let id = self.ids.next_id();
        let entry = ResultEntry::new(id, response.artifact, response.legend, source);
        let mut state = self.state.lock();
        let changes = state.dispatch(Action::RecordResult(entry), &self.palette)?;
        self.notify(&state, changes);

        let entry = state
            .history
            .resolve(id)
            .cloned()
            .ok_or(HistoryError::UnknownResult(id))?;
        tracing::info!(
            %id,
            bytes = entry.artifact().len(),
            legend = entry.legend().len(),
            "generated result"
        );
        Ok(entry)
    }

    /// Make a cached result active and load its source hotbar; no render
    ///
    /// # Errors
    /// - `SessionError::History` if the id is in neither cache
    pub fn restore(&self, id: ResultId) -> Result<Arc<ResultEntry>, SessionError> {
        let mut state = self.state.lock();
        let changes = state.dispatch(Action::Restore(id), &self.palette)?;
        self.notify(&state, changes);
        Ok(state
            .history
            .active()
            .cloned()
            .ok_or(HistoryError::UnknownResult(id))?)
    }

    /// Pin a cached result, or unpin it if already pinned
    ///
    /// # Errors
    /// - `SessionError::History` if the id is in neither cache
    pub fn toggle_pin(&self, id: ResultId) -> Result<PinState, SessionError> {
        let mut state = self.state.lock();
        let changes = state.dispatch(Action::TogglePin(id), &self.palette)?;
        self.notify(&state, changes);
        Ok(if state.history.is_pinned(id) {
            PinState::Pinned
        } else {
            PinState::Unpinned
        })
    }

    /// Write the whole state to every observer
    pub fn flush(&self) {
        let state = self.state.lock();
        self.notify(&state, ChangeSet::ALL);
    }

    fn notify(&self, state: &SessionState, changes: ChangeSet) {
        if changes.is_empty() {
            return;
        }
        for observer in &self.observers {
            observer.state_changed(state, changes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::MockStateObserver;
    use hotbar_model::WeightMode;
    use hotbar_test_utils::{FailingRenderer, StubRenderer};
    use mockall::predicate::always;

    fn controller(renderer: Arc<dyn Renderer>) -> SessionController {
        SessionController::new(HotbarConfig::default(), renderer).with_seed(7)
    }

    #[test]
    fn observers_see_committed_changes_only() {
        let mut observer = MockStateObserver::new();
        observer
            .expect_state_changed()
            .with(always(), mockall::predicate::eq(ChangeSet::FORM))
            .times(1)
            .return_const(());
        let controller = controller(Arc::new(StubRenderer::new())).with_observer(Arc::new(observer));

        controller
            .dispatch(Action::AddColor(ColorId::new("red")))
            .unwrap();
        assert!(controller
            .dispatch(Action::AddColor(ColorId::new("teal")))
            .is_err());
    }

    #[test]
    fn flush_reports_every_slot() {
        let mut observer = MockStateObserver::new();
        observer
            .expect_state_changed()
            .with(always(), mockall::predicate::eq(ChangeSet::ALL))
            .times(1)
            .return_const(());
        let controller = controller(Arc::new(StubRenderer::new())).with_observer(Arc::new(observer));
        controller.flush();
    }

    #[tokio::test]
    async fn generate_requires_choices() {
        let renderer = Arc::new(StubRenderer::new());
        let controller = controller(renderer.clone());

        assert!(matches!(controller.generate().await, Err(SessionError::NoChoices)));
        assert_eq!(renderer.calls(), 0);

        controller
            .dispatch(Action::SetWeightMode(WeightMode::Manual))
            .unwrap();
        controller
            .dispatch(Action::AddColor(ColorId::new("red")))
            .unwrap();
        assert!(matches!(controller.generate().await, Err(SessionError::NoChoices)));
    }

    #[tokio::test]
    async fn render_failure_records_nothing() {
        let renderer = Arc::new(FailingRenderer::transport());
        let controller = controller(renderer.clone());
        controller
            .dispatch(Action::AddColor(ColorId::new("red")))
            .unwrap();

        let err = controller.generate().await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(renderer.calls(), 1);
        controller.inspect(|state| {
            assert!(state.history.recent().is_empty());
            assert_eq!(state.history.active_id(), None);
        });
    }

    #[tokio::test]
    async fn seeded_randomize_is_reproducible() {
        let first = controller(Arc::new(StubRenderer::new()));
        let second = controller(Arc::new(StubRenderer::new()));
        first.randomize(PoolSource::Palette).await.unwrap();
        second.randomize(PoolSource::Palette).await.unwrap();

        assert_eq!(first.snapshot().form.assignment, second.snapshot().form.assignment);
    }
}
