use serde::{Deserialize, Serialize};

/// Render size: grid of `width` x `height` blocks, each `block_size` pixels square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub block_size: u32,
}

impl Dimensions {
    /// Create dimensions, raising any zero component to 1
    #[inline]
    #[must_use]
    pub fn new(width: u32, height: u32, block_size: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            block_size: block_size.max(1),
        }
    }

    /// Same dimensions with every component at least 1
    #[inline]
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(self.width, self.height, self.block_size)
    }

    /// Image size in pixels, `None` on overflow
    #[must_use]
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        let clamped = self.clamped();
        Some((
            clamped.width.checked_mul(clamped.block_size)?,
            clamped.height.checked_mul(clamped.block_size)?,
        ))
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(16, 16, 16)
    }
}
