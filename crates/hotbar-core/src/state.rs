//! Session state and its reducer
//!
//! All mutation goes through [`SessionState::dispatch`], which reports the
//! snapshot slots an action touched so observers can persist just those.

use crate::config::HotbarConfig;
use crate::error::SessionError;
use hotbar_history::{ChangeSet, FormState, History, PersistedSnapshot, ResultEntry, ResultId};
use hotbar_model::{ColorId, Dimensions, ModelError, Palette, SlotAssignment, WeightMode};

/// One state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Put a color in the first empty slot
    AddColor(ColorId),
    /// Set or clear one slot's color
    SetSlotColor {
        index: usize,
        color: Option<ColorId>,
    },
    /// Edit one slot's weight; manual mode only
    SetSlotWeight { index: usize, weight: u32 },
    ClearSlot(usize),
    ClearAll,
    SetWeightMode(WeightMode),
    SetDimensions(Dimensions),
    /// Add a color to the subset pool, or remove it if present
    ToggleSubsetColor(ColorId),
    /// Add a color to the locks, or remove it if present
    ToggleLock(ColorId),
    SetSubset(Vec<ColorId>),
    SetLocks(Vec<ColorId>),
    /// Replace the hotbar, e.g. with a randomized one
    ApplyAssignment(SlotAssignment),
    /// Store a rendered result and make it active
    RecordResult(ResultEntry),
    /// Make a cached result active and load its source hotbar
    Restore(ResultId),
    TogglePin(ResultId),
}

impl Action {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddColor(_) => "add_color",
            Self::SetSlotColor { .. } => "set_slot_color",
            Self::SetSlotWeight { .. } => "set_slot_weight",
            Self::ClearSlot(_) => "clear_slot",
            Self::ClearAll => "clear_all",
            Self::SetWeightMode(_) => "set_weight_mode",
            Self::SetDimensions(_) => "set_dimensions",
            Self::ToggleSubsetColor(_) => "toggle_subset_color",
            Self::ToggleLock(_) => "toggle_lock",
            Self::SetSubset(_) => "set_subset",
            Self::SetLocks(_) => "set_locks",
            Self::ApplyAssignment(_) => "apply_assignment",
            Self::RecordResult(_) => "record_result",
            Self::Restore(_) => "restore",
            Self::TogglePin(_) => "toggle_pin",
        }
    }
}

/// Everything a session owns
#[derive(Debug, Clone)]
pub struct SessionState {
    pub form: FormState,
    pub history: History,
}

impl SessionState {
    /// Fresh state for `config`
    #[must_use]
    pub fn new(config: &HotbarConfig) -> Self {
        Self {
            form: Self::default_form(config),
            history: History::new(config.recent_capacity, config.pinned_capacity),
        }
    }

    /// Form used when nothing was persisted
    #[must_use]
    pub fn default_form(config: &HotbarConfig) -> FormState {
        FormState {
            weight_mode: config.weight_mode,
            dimensions: config.dimensions,
            ..FormState::new(config.slot_count)
        }
    }

    /// State restored from a snapshot, with colors outside `palette` dropped
    #[must_use]
    pub fn from_snapshot(snapshot: PersistedSnapshot, palette: &Palette) -> Self {
        let mut state = Self {
            form: snapshot.form,
            history: snapshot.history,
        };
        state.sanitize(palette);
        state
    }

    /// Drop colors outside `palette` and re-derive automatic weights
    ///
    /// Returns true if any color was dropped.
    pub fn sanitize(&mut self, palette: &Palette) -> bool {
        let form = &mut self.form;
        let before = (form.pool_selection.len(), form.lock_selection.len());
        form.pool_selection.retain(|c| palette.contains(c));
        form.lock_selection.retain(|c| palette.contains(c));
        let mut dropped = before != (form.pool_selection.len(), form.lock_selection.len());

        let emptied = form.assignment.retain_colors(|c| palette.contains(c));
        form.assignment.apply_weights(form.weight_mode);
        dropped |= emptied > 0;

        if dropped {
            tracing::warn!(slots = emptied, "dropped colors missing from palette");
        }
        dropped
    }

    /// Number of hotbar slots
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.form.assignment.len()
    }

    /// Apply one action
    ///
    /// A rejected action leaves the state untouched.
    ///
    /// # Errors
    /// - `SessionError::Model` for unknown colors and bad slot edits
    /// - `SessionError::WeightsAreAutomatic` for weight edits in an auto mode
    /// - `SessionError::History` for ids in neither cache
    pub fn dispatch(&mut self, action: Action, palette: &Palette) -> Result<ChangeSet, SessionError> {
        let name = action.name();
        let changes = self.apply(action, palette)?;
        tracing::debug!(action = name, ?changes, "dispatched");
        Ok(changes)
    }

    fn apply(&mut self, action: Action, palette: &Palette) -> Result<ChangeSet, SessionError> {
        let mode = self.form.weight_mode;
        match action {
            Action::AddColor(color) => {
                known(palette, &color)?;
                self.form.assignment.add_color(color)?;
                self.form.assignment.apply_weights(mode);
                Ok(ChangeSet::FORM)
            }
            Action::SetSlotColor { index, color } => {
                if let Some(color) = &color {
                    known(palette, color)?;
                }
                self.form.assignment.set_color(index, color)?;
                self.form.assignment.apply_weights(mode);
                Ok(ChangeSet::FORM)
            }
            Action::SetSlotWeight { index, weight } => {
                if mode.is_automatic() {
                    return Err(SessionError::WeightsAreAutomatic {
                        mode: mode_name(mode),
                    });
                }
                self.form.assignment.set_weight(index, weight)?;
                Ok(ChangeSet::FORM)
            }
            Action::ClearSlot(index) => {
                self.form.assignment.clear_slot(index)?;
                self.form.assignment.apply_weights(mode);
                Ok(ChangeSet::FORM)
            }
            Action::ClearAll => {
                self.form.assignment.clear_all();
                Ok(ChangeSet::FORM)
            }
            Action::SetWeightMode(mode) => {
                self.form.weight_mode = mode;
                self.form.assignment.apply_weights(mode);
                Ok(ChangeSet::FORM)
            }
            Action::SetDimensions(dimensions) => {
                self.form.dimensions = dimensions.clamped();
                Ok(ChangeSet::FORM)
            }
            Action::ToggleSubsetColor(color) => {
                known(palette, &color)?;
                toggle(&mut self.form.pool_selection, color);
                Ok(ChangeSet::FORM)
            }
            Action::ToggleLock(color) => {
                known(palette, &color)?;
                toggle(&mut self.form.lock_selection, color);
                Ok(ChangeSet::FORM)
            }
            Action::SetSubset(colors) => {
                self.form.pool_selection = distinct_known(palette, colors)?;
                Ok(ChangeSet::FORM)
            }
            Action::SetLocks(colors) => {
                self.form.lock_selection = distinct_known(palette, colors)?;
                Ok(ChangeSet::FORM)
            }
            Action::ApplyAssignment(assignment) => {
                for color in assignment.colors() {
                    known(palette, color)?;
                }
                let mut assignment = assignment.normalized(self.slot_count());
                assignment.apply_weights(mode);
                self.form.assignment = assignment;
                Ok(ChangeSet::FORM)
            }
            Action::RecordResult(entry) => {
                self.history.record(entry);
                Ok(ChangeSet {
                    recent: true,
                    active: true,
                    ..ChangeSet::NONE
                })
            }
            Action::Restore(id) => {
                let entry = self.history.select(id)?;
                let mut assignment = entry.source().normalized(self.slot_count());
                assignment.apply_weights(mode);
                self.form.assignment = assignment;
                Ok(ChangeSet {
                    form: true,
                    active: true,
                    ..ChangeSet::NONE
                })
            }
            Action::TogglePin(id) => {
                self.history.toggle_pin(id)?;
                Ok(ChangeSet {
                    pinned: true,
                    active: true,
                    ..ChangeSet::NONE
                })
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(&HotbarConfig::default())
    }
}

fn known(palette: &Palette, color: &ColorId) -> Result<(), ModelError> {
    if palette.contains(color) {
        Ok(())
    } else {
        Err(ModelError::UnknownColor(color.clone()))
    }
}

fn distinct_known(palette: &Palette, colors: Vec<ColorId>) -> Result<Vec<ColorId>, ModelError> {
    let mut selection: Vec<ColorId> = Vec::with_capacity(colors.len());
    for color in colors {
        known(palette, &color)?;
        if !selection.contains(&color) {
            selection.push(color);
        }
    }
    Ok(selection)
}

fn toggle(selection: &mut Vec<ColorId>, color: ColorId) {
    if let Some(position) = selection.iter().position(|c| *c == color) {
        selection.remove(position);
    } else {
        selection.push(color);
    }
}

fn mode_name(mode: WeightMode) -> &'static str {
    match mode {
        WeightMode::Manual => "manual",
        WeightMode::UnitPerSlot => "unit-per-slot",
        WeightMode::CountPerColor => "count-per-color",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotbar_history::{CacheLimits, MemoryStore, PersistenceSync};
    use hotbar_model::Choice;
    use hotbar_test_utils::result_entry;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn color(name: &str) -> ColorId {
        ColorId::new(name)
    }

    fn run(state: &mut SessionState, action: Action) -> Result<ChangeSet, SessionError> {
        state.dispatch(action, &Palette::dyes())
    }

    #[test]
    fn unit_weights_follow_edits() {
        let mut state = SessionState::default();
        run(&mut state, Action::AddColor(color("red"))).unwrap();
        run(&mut state, Action::AddColor(color("blue"))).unwrap();

        assert_eq!(
            state.form.assignment.choices(),
            vec![Choice::new("red", 1), Choice::new("blue", 1)]
        );
    }

    #[test]
    fn count_weights_follow_edits() {
        let mut state = SessionState::default();
        run(&mut state, Action::SetWeightMode(WeightMode::CountPerColor)).unwrap();
        for name in ["red", "red", "blue"] {
            run(&mut state, Action::AddColor(color(name))).unwrap();
        }
        let weights: Vec<u32> = state.form.assignment.choices().iter().map(|c| c.weight).collect();
        assert_eq!(weights, vec![2, 2, 1]);

        run(&mut state, Action::ClearSlot(0)).unwrap();
        let weights: Vec<u32> = state.form.assignment.choices().iter().map(|c| c.weight).collect();
        assert_eq!(weights, vec![1, 1]);
    }

    #[test]
    fn manual_weights_only_in_manual_mode() {
        let mut state = SessionState::default();
        run(&mut state, Action::AddColor(color("red"))).unwrap();

        let err = run(&mut state, Action::SetSlotWeight { index: 0, weight: 5 }).unwrap_err();
        assert!(matches!(err, SessionError::WeightsAreAutomatic { mode: "unit-per-slot" }));

        run(&mut state, Action::SetWeightMode(WeightMode::Manual)).unwrap();
        run(&mut state, Action::SetSlotWeight { index: 0, weight: 5 }).unwrap();
        assert_eq!(state.form.assignment.choices(), vec![Choice::new("red", 5)]);

        let err = run(&mut state, Action::SetSlotWeight { index: 3, weight: 1 }).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Model(ModelError::WeightWithoutColor { index: 3 })
        ));
    }

    #[test]
    fn unknown_colors_are_rejected_without_mutation() {
        let mut state = SessionState::default();
        let before = state.form.clone();
        for action in [
            Action::AddColor(color("teal")),
            Action::ToggleLock(color("teal")),
            Action::SetSubset(vec![color("red"), color("teal")]),
            Action::SetSlotColor {
                index: 0,
                color: Some(color("teal")),
            },
        ] {
            let err = run(&mut state, action).unwrap_err();
            assert!(matches!(err, SessionError::Model(ModelError::UnknownColor(_))));
        }
        assert_eq!(state.form, before);
    }

    #[test]
    fn full_hotbar_is_reported() {
        let mut state = SessionState::new(&HotbarConfig::new().with_slot_count(2));
        run(&mut state, Action::AddColor(color("red"))).unwrap();
        run(&mut state, Action::AddColor(color("red"))).unwrap();
        let err = run(&mut state, Action::AddColor(color("red"))).unwrap_err();
        assert!(matches!(err, SessionError::Model(ModelError::SlotsFull { capacity: 2 })));
    }

    #[test]
    fn selections_toggle_in_insertion_order() {
        let mut state = SessionState::default();
        for name in ["red", "blue", "lime"] {
            run(&mut state, Action::ToggleSubsetColor(color(name))).unwrap();
        }
        run(&mut state, Action::ToggleSubsetColor(color("blue"))).unwrap();
        assert_eq!(state.form.pool_selection, vec![color("red"), color("lime")]);

        run(&mut state, Action::SetLocks(vec![color("pink"), color("pink"), color("cyan")])).unwrap();
        assert_eq!(state.form.lock_selection, vec![color("pink"), color("cyan")]);
    }

    #[test]
    fn change_sets_name_touched_slots() {
        let mut state = SessionState::default();
        assert_eq!(run(&mut state, Action::ClearAll).unwrap(), ChangeSet::FORM);

        let changes = run(&mut state, Action::RecordResult(result_entry(1, &["red"]))).unwrap();
        assert!(changes.recent && changes.active && !changes.form && !changes.pinned);

        let changes = run(&mut state, Action::TogglePin(ResultId::from_raw(1))).unwrap();
        assert!(changes.pinned && !changes.recent);

        let changes = run(&mut state, Action::Restore(ResultId::from_raw(1))).unwrap();
        assert!(changes.form && changes.active && !changes.recent);
    }

    #[test]
    fn restore_loads_source_hotbar() {
        let mut state = SessionState::default();
        run(&mut state, Action::RecordResult(result_entry(1, &["red", "blue"]))).unwrap();
        run(&mut state, Action::RecordResult(result_entry(2, &["lime"]))).unwrap();

        run(&mut state, Action::Restore(ResultId::from_raw(1))).unwrap();
        assert_eq!(state.history.active_id(), Some(ResultId::from_raw(1)));
        assert_eq!(
            state.form.assignment.choices(),
            vec![Choice::new("red", 1), Choice::new("blue", 1)]
        );

        let err = run(&mut state, Action::Restore(ResultId::from_raw(99))).unwrap_err();
        assert!(matches!(err, SessionError::History(_)));
        assert_eq!(state.history.active_id(), Some(ResultId::from_raw(1)));
    }

    #[test]
    fn applied_assignment_gets_weights() {
        let mut state = SessionState::default();
        let randomized =
            SlotAssignment::from_colors(9, [color("red"), color("blue"), color("red")]).unwrap();
        run(&mut state, Action::ApplyAssignment(randomized)).unwrap();
        assert_eq!(state.form.assignment.choices().len(), 3);

        run(&mut state, Action::SetWeightMode(WeightMode::Manual)).unwrap();
        let randomized = SlotAssignment::from_colors(9, [color("red")]).unwrap();
        run(&mut state, Action::ApplyAssignment(randomized)).unwrap();
        assert!(state.form.assignment.choices().is_empty());
    }

    #[test]
    fn snapshot_colors_outside_palette_are_dropped() {
        let store = Arc::new(MemoryStore::new());
        let sync = PersistenceSync::new(store, CacheLimits::default());
        let mut form = FormState::default();
        form.assignment = SlotAssignment::from_choices(
            9,
            &[Choice::new("red", 1), Choice::new("teal", 1), Choice::new("red", 1)],
        );
        form.pool_selection = vec![color("teal"), color("blue")];
        sync.save_all(&History::default(), &form);

        let state = SessionState::from_snapshot(sync.load(&FormState::default()), &Palette::dyes());
        assert_eq!(state.form.pool_selection, vec![color("blue")]);
        assert_eq!(
            state.form.assignment.colors().cloned().collect::<Vec<_>>(),
            vec![color("red"), color("red")]
        );
        assert!(state.form.assignment.get(1).is_some_and(|slot| slot.weight == 0));
    }

    #[test]
    fn snapshot_weights_follow_persisted_mode() {
        let stale = [Choice::new("red", 5), Choice::new("blue", 5), Choice::new("red", 5)];
        let mut form = FormState::default();
        form.assignment = SlotAssignment::from_choices(9, &stale);
        form.weight_mode = WeightMode::CountPerColor;

        let state = SessionState::from_snapshot(
            PersistedSnapshot {
                history: History::default(),
                form: form.clone(),
            },
            &Palette::dyes(),
        );
        assert_eq!(
            state.form.assignment.choices(),
            vec![Choice::new("red", 2), Choice::new("blue", 1), Choice::new("red", 2)]
        );

        form.weight_mode = WeightMode::Manual;
        let state = SessionState::from_snapshot(
            PersistedSnapshot {
                history: History::default(),
                form,
            },
            &Palette::dyes(),
        );
        assert_eq!(state.form.assignment.choices(), stale.to_vec());
    }
}
