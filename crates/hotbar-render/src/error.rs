//! Error types for rendering

use hotbar_model::ColorId;

/// Renderer failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Request carried no colors
    #[error("no colors with positive weight to render")]
    EmptyChoices,

    /// Color the backend cannot paint
    #[error("invalid color: '{0}'")]
    UnknownColor(ColorId),

    /// Output would exceed the backend's size limit
    #[error("image of {width}x{height} blocks at {block_size}px exceeds size limit")]
    TooLarge {
        width: u32,
        height: u32,
        block_size: u32,
    },

    /// Image encoding failed
    #[error("encoding failed: {0}")]
    Encode(String),

    /// Remote backend unreachable or returned a failure
    #[error("transport failure: {0}")]
    Transport(String),
}

impl RenderError {
    /// Check if the request itself was at fault
    #[inline]
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::EmptyChoices | Self::UnknownColor(_) | Self::TooLarge { .. }
        )
    }
}
