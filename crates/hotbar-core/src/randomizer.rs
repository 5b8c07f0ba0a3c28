//! Constrained hotbar randomization
//!
//! Locked colors go first, in order; the rest of the filled prefix is drawn
//! with replacement from the pool. A candidate whose colors are all the same
//! is rejected whenever the inputs offered more than one color.

use crate::config::HotbarConfig;
use crate::error::RandomizeError;
use hotbar_model::{ColorId, SlotAssignment};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;

/// Smallest number of filled slots a randomized hotbar may have
pub const MIN_FILL_FLOOR: usize = 2;

/// Randomizer with a bounded retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Randomizer {
    max_attempts: u32,
    min_fill: usize,
}

impl Randomizer {
    /// Create randomizer; `max_attempts` is raised to 1 and `min_fill` to [`MIN_FILL_FLOOR`]
    #[inline]
    #[must_use]
    pub fn new(max_attempts: u32, min_fill: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_fill: min_fill.max(MIN_FILL_FLOOR),
        }
    }

    /// Create randomizer from session configuration
    #[inline]
    #[must_use]
    pub fn from_config(config: &HotbarConfig) -> Self {
        Self::new(config.max_attempts, config.min_fill)
    }

    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Produce a `total`-slot hotbar from `pool` and `locked`
    ///
    /// Filled slots come first with weight 0; the caller applies its weight
    /// mode. With an empty pool only the locked colors are placed.
    ///
    /// # Errors
    /// - `RandomizeError::TooManyLocks` if `locked` does not fit
    /// - `RandomizeError::EmptySelection` if both inputs are empty
    /// - `RandomizeError::NoVariedAssignment` if every attempt was single-color
    pub fn randomize<R: Rng>(
        &self,
        pool: &[ColorId],
        locked: &[ColorId],
        total: usize,
        rng: &mut R,
    ) -> Result<SlotAssignment, RandomizeError> {
        if locked.len() > total {
            return Err(RandomizeError::TooManyLocks {
                locks: locked.len(),
                slots: total,
            });
        }
        if pool.is_empty() && locked.is_empty() {
            return Err(RandomizeError::EmptySelection);
        }

        let varied = pool.iter().chain(locked).collect::<HashSet<_>>().len() > 1;
        let min_fill = self.min_fill.max(locked.len()).min(total);

        for attempt in 1..=self.max_attempts {
            let filled = if pool.is_empty() {
                locked.len()
            } else {
                rng.random_range(min_fill..=total)
            };

            let mut candidate = locked.to_vec();
            candidate.extend(
                (locked.len()..filled).filter_map(|_| pool.choose(rng).cloned()),
            );

            if varied && is_single_color(&candidate) {
                tracing::debug!(attempt, filled, "rejected single-color candidate");
                continue;
            }

            tracing::debug!(attempt, filled, "randomized hotbar");
            return Ok(SlotAssignment::from_colors(total, candidate)?);
        }

        Err(RandomizeError::NoVariedAssignment {
            attempts: self.max_attempts,
        })
    }
}

impl Default for Randomizer {
    fn default() -> Self {
        Self::from_config(&HotbarConfig::default())
    }
}

fn is_single_color(candidate: &[ColorId]) -> bool {
    candidate.windows(2).all(|pair| pair[0] == pair[1])
}
