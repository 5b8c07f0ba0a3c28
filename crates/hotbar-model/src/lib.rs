//! Hotbar Model
//!
//! Plain data types shared by every hotbar crate.
//!
//! # Core Concepts
//!
//! - [`ColorId`]: Opaque, value-compared palette color identifier
//! - [`Palette`]: Ordered color table (the 16 dye colors by default)
//! - [`SlotAssignment`]: Fixed-length sequence of [`Slot`]s
//! - [`WeightMode`]: How slot weights are derived
//! - [`LegendEntry`]: Aggregated per-color weight totals
//! - [`Dimensions`]: Render size in blocks and pixels per block
//!
//! # Example
//!
//! ```rust
//! use hotbar_model::{ColorId, SlotAssignment, WeightMode};
//!
//! let mut hotbar = SlotAssignment::new(9);
//! hotbar.add_color(ColorId::new("red")).unwrap();
//! hotbar.add_color(ColorId::new("blue")).unwrap();
//! hotbar.apply_weights(WeightMode::UnitPerSlot);
//!
//! assert_eq!(hotbar.choices().len(), 2);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod color;
mod dimensions;
mod error;
mod legend;
mod slot;

// Re-exports
pub use color::{ColorId, Palette, Rgb, FALLBACK_RGB};
pub use dimensions::Dimensions;
pub use error::ModelError;
pub use legend::{aggregate_legend, LegendEntry};
pub use slot::{Choice, Slot, SlotAssignment, WeightMode, DEFAULT_SLOT_COUNT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn hotbar_to_legend() {
        let palette = Palette::dyes();
        let mut hotbar = SlotAssignment::new(DEFAULT_SLOT_COUNT);
        for name in ["red", "red", "blue"] {
            hotbar.add_color(ColorId::new(name)).unwrap();
        }
        hotbar.apply_weights(WeightMode::UnitPerSlot);

        let legend = aggregate_legend(&hotbar.choices(), &palette);
        assert_eq!(legend.len(), 2);
        assert_eq!(legend[0].name, ColorId::new("red"));
        assert_eq!(legend[0].total_weight, 2);
        assert_eq!(legend[0].rgb, Some(Rgb::new(176, 46, 38)));
    }

    #[test]
    fn every_dye_is_drawable() {
        let palette = Palette::dyes();
        let mut hotbar = SlotAssignment::new(palette.len());
        for id in palette.ids() {
            hotbar.add_color(id.clone()).unwrap();
        }
        assert!(hotbar.is_full());
        assert!(hotbar.add_color(ColorId::new("white")).is_err());
    }
}
