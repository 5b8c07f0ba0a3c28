//! Hotbar Render
//!
//! The renderer capability consumed by the session controller, plus a local
//! backend that paints a weighted block grid to PNG.
//!
//! # Contract
//!
//! One [`RenderRequest`] in, one [`RenderResponse`] or [`RenderError`] out.
//! Backends are free to run remotely; the controller only relies on the
//! [`Renderer`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use hotbar_render::{GridRenderer, RenderRequest, Renderer};
//!
//! let renderer = GridRenderer::new(Palette::dyes());
//! let response = renderer.render(request).await?;
//! std::fs::write("preview.png", &response.artifact)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod grid;

pub use error::RenderError;
pub use grid::{GridRenderer, MAX_IMAGE_PIXELS, MAX_IMAGE_SIDE};

use async_trait::async_trait;
use hotbar_model::{Choice, Dimensions, LegendEntry};
use std::sync::Arc;

/// Request for one rendered artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Colors with positive weight, in slot order
    pub choices: Vec<Choice>,
    /// Grid size in blocks
    pub width: u32,
    pub height: u32,
    /// Pixels per block side
    pub block_size: u32,
}

impl RenderRequest {
    /// Create request from choices and dimensions
    #[inline]
    #[must_use]
    pub fn new(choices: Vec<Choice>, dimensions: Dimensions) -> Self {
        Self {
            choices,
            width: dimensions.width,
            height: dimensions.height,
            block_size: dimensions.block_size,
        }
    }

    /// Requested dimensions, clamped to at least 1
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height, self.block_size)
    }
}

/// Rendered artifact plus its legend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResponse {
    /// Encoded image bytes
    pub artifact: Vec<u8>,
    pub legend: Vec<LegendEntry>,
}

/// Renderer capability
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render one request
    ///
    /// # Errors
    /// Backend specific; see [`RenderError`].
    async fn render(&self, request: RenderRequest) -> Result<RenderResponse, RenderError>;
}

#[async_trait]
impl<R: Renderer + ?Sized> Renderer for Arc<R> {
    async fn render(&self, request: RenderRequest) -> Result<RenderResponse, RenderError> {
        (**self).render(request).await
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
