//! Slots and slot assignments
//!
//! A [`SlotAssignment`] is the authoritative representation of the hotbar:
//! a fixed number of [`Slot`]s, each with an optional color and a weight.
//!
//! Invariant: a slot has `weight > 0` only if it holds a color.

use crate::color::ColorId;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default hotbar length
pub const DEFAULT_SLOT_COUNT: usize = 9;

/// One hotbar position
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Assigned color, if any
    pub color: Option<ColorId>,
    /// Draw weight
    pub weight: u32,
}

impl Slot {
    /// Empty slot
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Slot holding a color
    #[inline]
    #[must_use]
    pub fn filled(color: ColorId, weight: u32) -> Self {
        Self {
            color: Some(color),
            weight,
        }
    }

    /// Check if slot has no color
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
    }

    fn clear(&mut self) {
        self.color = None;
        self.weight = 0;
    }
}

/// A color with positive weight, as sent to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Choice {
    pub color: ColorId,
    pub weight: u32,
}

impl Choice {
    /// Create choice
    #[inline]
    #[must_use]
    pub fn new(color: impl Into<ColorId>, weight: u32) -> Self {
        Self {
            color: color.into(),
            weight,
        }
    }
}

/// How slot weights are derived
///
/// The two automatic modes differ when a color occupies several slots:
/// `UnitPerSlot` gives each slot weight 1 (so the legend total for a color
/// equals its slot count), `CountPerColor` gives each slot the slot count
/// (so the legend total is the square of it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMode {
    /// Weights are edited by hand
    Manual,
    /// Every filled slot has weight 1
    #[default]
    UnitPerSlot,
    /// Every filled slot has weight equal to the number of slots sharing its color
    CountPerColor,
}

impl WeightMode {
    /// Check if weights are derived rather than edited
    #[inline]
    #[must_use]
    pub fn is_automatic(self) -> bool {
        !matches!(self, Self::Manual)
    }
}

/// Fixed-length hotbar
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotAssignment {
    slots: Vec<Slot>,
}

impl SlotAssignment {
    /// All-empty hotbar with `slot_count` slots
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![Slot::empty(); slot_count],
        }
    }

    /// Fill leading slots with `colors` at weight 0, leaving the rest empty
    ///
    /// # Errors
    /// - `ModelError::TooManyColors` if there are more colors than slots
    pub fn from_colors<I>(slot_count: usize, colors: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = ColorId>,
    {
        let colors: Vec<ColorId> = colors.into_iter().collect();
        if colors.len() > slot_count {
            return Err(ModelError::TooManyColors {
                count: colors.len(),
                capacity: slot_count,
            });
        }

        let mut assignment = Self::new(slot_count);
        for (slot, color) in assignment.slots.iter_mut().zip(colors) {
            slot.color = Some(color);
        }
        Ok(assignment)
    }

    /// Fill slots sequentially from renderer choices; overflow is dropped
    #[must_use]
    pub fn from_choices(slot_count: usize, choices: &[Choice]) -> Self {
        let mut assignment = Self::new(slot_count);
        for (slot, choice) in assignment.slots.iter_mut().zip(choices) {
            *slot = Slot::filled(choice.color.clone(), choice.weight);
        }
        assignment
    }

    /// Copy padded with empty slots or truncated to `slot_count`
    #[must_use]
    pub fn normalized(&self, slot_count: usize) -> Self {
        let mut slots = self.slots.clone();
        slots.resize(slot_count, Slot::empty());
        for slot in &mut slots {
            if slot.is_empty() {
                slot.weight = 0;
            }
        }
        Self { slots }
    }

    /// Number of slots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if hotbar has zero slots
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots in order
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Number of slots holding a color
    #[must_use]
    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    /// Check if every slot holds a color
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| !s.is_empty())
    }

    /// Colors of filled slots in slot order
    pub fn colors(&self) -> impl Iterator<Item = &ColorId> {
        self.slots.iter().filter_map(|s| s.color.as_ref())
    }

    /// Put `color` in the first empty slot, returning its index
    ///
    /// # Errors
    /// - `ModelError::SlotsFull` if no slot is empty
    pub fn add_color(&mut self, color: ColorId) -> Result<usize, ModelError> {
        let capacity = self.slots.len();
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.is_empty())
            .ok_or(ModelError::SlotsFull { capacity })?;
        slot.color = Some(color);
        Ok(index)
    }

    /// Set or clear the color of one slot
    ///
    /// Clearing also resets the weight to keep the invariant.
    ///
    /// # Errors
    /// - `ModelError::SlotOutOfRange` for a bad index
    pub fn set_color(&mut self, index: usize, color: Option<ColorId>) -> Result<(), ModelError> {
        let slot = self.slot_mut(index)?;
        match color {
            Some(color) => slot.color = Some(color),
            None => slot.clear(),
        }
        Ok(())
    }

    /// Set the weight of one slot
    ///
    /// # Errors
    /// - `ModelError::SlotOutOfRange` for a bad index
    /// - `ModelError::WeightWithoutColor` for a positive weight on an empty slot
    pub fn set_weight(&mut self, index: usize, weight: u32) -> Result<(), ModelError> {
        let slot = self.slot_mut(index)?;
        if weight > 0 && slot.is_empty() {
            return Err(ModelError::WeightWithoutColor { index });
        }
        slot.weight = weight;
        Ok(())
    }

    /// Empty one slot
    ///
    /// # Errors
    /// - `ModelError::SlotOutOfRange` for a bad index
    pub fn clear_slot(&mut self, index: usize) -> Result<(), ModelError> {
        self.slot_mut(index)?.clear();
        Ok(())
    }

    /// Empty every slot whose color fails `keep`; returns how many were emptied
    pub fn retain_colors(&mut self, mut keep: impl FnMut(&ColorId) -> bool) -> usize {
        let mut emptied = 0;
        for slot in &mut self.slots {
            if slot.color.as_ref().is_some_and(|c| !keep(c)) {
                slot.clear();
                emptied += 1;
            }
        }
        emptied
    }

    /// Empty every slot
    pub fn clear_all(&mut self) {
        self.slots.iter_mut().for_each(Slot::clear);
    }

    /// Reset every weight to 0
    pub fn clear_weights(&mut self) {
        for slot in &mut self.slots {
            slot.weight = 0;
        }
    }

    /// Recompute weights for an automatic mode; `Manual` leaves them alone
    pub fn apply_weights(&mut self, mode: WeightMode) {
        match mode {
            WeightMode::Manual => {}
            WeightMode::UnitPerSlot => {
                for slot in &mut self.slots {
                    slot.weight = u32::from(!slot.is_empty());
                }
            }
            WeightMode::CountPerColor => {
                let mut counts: HashMap<ColorId, u32> = HashMap::new();
                for color in self.colors() {
                    *counts.entry(color.clone()).or_default() += 1;
                }
                for slot in &mut self.slots {
                    slot.weight = slot
                        .color
                        .as_ref()
                        .and_then(|c| counts.get(c).copied())
                        .unwrap_or(0);
                }
            }
        }
    }

    /// Filled slots with positive weight, in slot order
    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.slots
            .iter()
            .filter(|s| s.weight > 0)
            .filter_map(|s| s.color.clone().map(|color| Choice::new(color, s.weight)))
            .collect()
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut Slot, ModelError> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(ModelError::SlotOutOfRange { index, len })
    }
}

impl Default for SlotAssignment {
    /// Empty hotbar with [`DEFAULT_SLOT_COUNT`] slots
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}
