//! Hotbar Core - session orchestration
//!
//! Ties the model, renderer, and history crates together:
//! - Constrained randomization of the hotbar from a pool and locks
//! - A reducer over [`SessionState`] that reports touched snapshot slots
//! - [`SessionController`]: generate, randomize, restore, and pin with
//!   write-through persistence
//!
//! # Example
//!
//! ```rust,ignore
//! use hotbar_core::{HotbarConfig, PoolSource, SessionController};
//! use hotbar_history::MemoryStore;
//! use hotbar_model::Palette;
//! use hotbar_render::GridRenderer;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), hotbar_core::SessionError> {
//! let controller = SessionController::open(
//!     HotbarConfig::new(),
//!     Arc::new(GridRenderer::new(Palette::dyes())),
//!     Arc::new(MemoryStore::new()),
//! );
//!
//! let entry = controller.randomize(PoolSource::Palette).await?;
//! println!("result {} with {} legend entries", entry.id(), entry.legend().len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod controller;
pub mod error;
pub mod observer;
pub mod randomizer;
pub mod state;

// Re-exports for convenience
pub use config::HotbarConfig;
pub use controller::{PoolSource, SessionController};
pub use error::{ConfigError, RandomizeError, SessionError};
pub use observer::StateObserver;
pub use randomizer::{Randomizer, MIN_FILL_FLOOR};
pub use state::{Action, SessionState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a session
    pub use crate::{Action, HotbarConfig, PoolSource, SessionController, SessionError};
    pub use hotbar_history::{PinState, ResultEntry, ResultId};
    pub use hotbar_model::{ColorId, Dimensions, Palette, WeightMode};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use hotbar_model::{ColorId, Palette};
    use hotbar_render::GridRenderer;
    use std::sync::Arc;

    #[tokio::test]
    async fn grid_renderer_full_flow() {
        let renderer = Arc::new(GridRenderer::with_seed(Palette::dyes(), 3));
        let controller = SessionController::new(HotbarConfig::new(), renderer).with_seed(3);

        controller
            .dispatch(Action::SetLocks(vec![ColorId::new("black")]))
            .unwrap();
        let entry = controller.randomize(PoolSource::Palette).await.unwrap();

        assert!(entry.artifact().bytes().starts_with(b"\x89PNG"));
        assert_eq!(entry.source().get(0).and_then(|s| s.color.clone()), Some(ColorId::new("black")));
        assert!(entry.legend().iter().any(|l| l.name.as_str() == "black"));
    }
}
