//! Session configuration
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```toml
//! slot_count = 9
//! recent_capacity = 20
//! weight_mode = "count_per_color"
//!
//! [dimensions]
//! width = 32
//! ```

use crate::error::ConfigError;
use crate::randomizer::MIN_FILL_FLOOR;
use hotbar_history::CacheLimits;
use hotbar_model::{Dimensions, WeightMode, DEFAULT_SLOT_COUNT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HotbarConfig {
    /// Number of hotbar slots
    pub slot_count: usize,
    /// Capacity of the recent results cache
    pub recent_capacity: usize,
    /// Capacity of the pinned results cache
    pub pinned_capacity: usize,
    /// Randomizer retry budget
    pub max_attempts: u32,
    /// Minimum number of filled slots in a randomized hotbar
    pub min_fill: usize,
    /// Weight mode for a fresh session
    pub weight_mode: WeightMode,
    /// Render dimensions for a fresh session
    pub dimensions: Dimensions,
    /// Snapshot directory for file-backed sessions
    pub state_dir: Option<PathBuf>,
}

impl HotbarConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With slot count
    #[inline]
    #[must_use]
    pub fn with_slot_count(mut self, slots: usize) -> Self {
        self.slot_count = slots;
        self
    }

    /// With recent cache capacity
    #[inline]
    #[must_use]
    pub fn with_recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity;
        self
    }

    /// With pinned cache capacity
    #[inline]
    #[must_use]
    pub fn with_pinned_capacity(mut self, capacity: usize) -> Self {
        self.pinned_capacity = capacity;
        self
    }

    /// With randomizer retry budget
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_min_fill(mut self, min_fill: usize) -> Self {
        self.min_fill = min_fill;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_weight_mode(mut self, mode: WeightMode) -> Self {
        self.weight_mode = mode;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    /// Cache capacities for persistence
    #[must_use]
    pub fn cache_limits(&self) -> CacheLimits {
        CacheLimits {
            recent: self.recent_capacity,
            pinned: self.pinned_capacity,
        }
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML or unknown keys
    /// - `ConfigError::Invalid` for out-of-range values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - see [`Self::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let at_least_one = [
            ("slot_count", self.slot_count),
            ("recent_capacity", self.recent_capacity),
            ("pinned_capacity", self.pinned_capacity),
        ];
        for (field, value) in at_least_one {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be at least 1"));
            }
        }
        if self.min_fill < MIN_FILL_FLOOR {
            return Err(ConfigError::invalid(
                "min_fill",
                format!("must be at least {MIN_FILL_FLOOR}"),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("max_attempts", "must be at least 1"));
        }
        let Dimensions {
            width,
            height,
            block_size,
        } = self.dimensions;
        if width == 0 || height == 0 || block_size == 0 {
            return Err(ConfigError::invalid(
                "dimensions",
                format!("{width}x{height} at {block_size}px has a zero side"),
            ));
        }
        Ok(())
    }
}

impl Default for HotbarConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            recent_capacity: hotbar_history::DEFAULT_CAPACITY,
            pinned_capacity: hotbar_history::DEFAULT_CAPACITY,
            max_attempts: 30,
            min_fill: 2,
            weight_mode: WeightMode::default(),
            dimensions: Dimensions::default(),
            state_dir: None,
        }
    }
}
