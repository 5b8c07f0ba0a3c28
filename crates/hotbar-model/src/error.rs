//! Error types for model operations

use crate::color::ColorId;

/// Errors from editing a slot assignment
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Every slot already holds a color
    #[error("all slots are full (max {capacity}); remove one first")]
    SlotsFull { capacity: usize },

    /// Slot index past the end of the hotbar
    #[error("slot {index} out of range (hotbar has {len} slots)")]
    SlotOutOfRange { index: usize, len: usize },

    /// Positive weight on a slot without a color
    #[error("slot {index} is empty and cannot carry weight")]
    WeightWithoutColor { index: usize },

    /// More colors than slots
    #[error("{count} colors do not fit in {capacity} slots")]
    TooManyColors { count: usize, capacity: usize },

    /// Color not present in the palette
    #[error("unknown color: '{0}'")]
    UnknownColor(ColorId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_full_display() {
        let err = ModelError::SlotsFull { capacity: 9 };
        assert_eq!(err.to_string(), "all slots are full (max 9); remove one first");
    }

    #[test]
    fn unknown_color_display() {
        let err = ModelError::UnknownColor(ColorId::new("teal"));
        assert_eq!(err.to_string(), "unknown color: 'teal'");
    }
}
