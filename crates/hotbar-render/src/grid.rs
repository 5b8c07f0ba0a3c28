//! Local block-grid renderer
//!
//! Every block of the grid independently picks one choice with probability
//! proportional to its weight. All-zero weights fall back to a uniform pick.
//! Painting and PNG encoding run on the blocking pool.

use crate::error::RenderError;
use crate::{RenderRequest, RenderResponse, Renderer};
use async_trait::async_trait;
use hotbar_model::{aggregate_legend, Choice, Dimensions, Palette, Rgb, FALLBACK_RGB};
use image::RgbImage;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;

/// Largest accepted image side in pixels
pub const MAX_IMAGE_SIDE: u32 = 16_384;

/// Largest accepted image area in pixels
pub const MAX_IMAGE_PIXELS: u64 = 4_096 * 4_096;

/// In-process renderer producing PNG artifacts
#[derive(Debug)]
pub struct GridRenderer {
    palette: Palette,
    rng: Mutex<StdRng>,
}

impl GridRenderer {
    /// Create renderer seeded from the OS
    #[must_use]
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Create deterministic renderer
    #[must_use]
    pub fn with_seed(palette: Palette, seed: u64) -> Self {
        Self {
            palette,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Palette used to resolve colors
    #[inline]
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    fn validate(&self, choices: &[Choice]) -> Result<(), RenderError> {
        if choices.is_empty() {
            return Err(RenderError::EmptyChoices);
        }
        if let Some(unknown) = choices.iter().find(|c| !self.palette.contains(&c.color)) {
            return Err(RenderError::UnknownColor(unknown.color.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl Renderer for GridRenderer {
    async fn render(&self, request: RenderRequest) -> Result<RenderResponse, RenderError> {
        let dims = request.dimensions();
        check_size(dims)?;
        self.validate(&request.choices)?;

        let weights = effective_weights(&request.choices);
        let colors: Vec<Rgb> = request
            .choices
            .iter()
            .map(|c| self.palette.get(&c.color).unwrap_or(FALLBACK_RGB))
            .collect();
        let mut rng = StdRng::seed_from_u64(self.rng.lock().random());

        let artifact = tokio::task::spawn_blocking(move || {
            encode_png(&paint(&weights, &colors, dims, &mut rng))
        })
        .await
        .map_err(|e| RenderError::Encode(e.to_string()))??;
        let legend = aggregate_legend(&request.choices, &self.palette);

        tracing::debug!(
            width = dims.width,
            height = dims.height,
            block_size = dims.block_size,
            bytes = artifact.len(),
            "rendered block grid"
        );
        Ok(RenderResponse { artifact, legend })
    }
}

/// Reject images over either the side or the area limit
fn check_size(dims: Dimensions) -> Result<(), RenderError> {
    let fits = dims.pixel_size().is_some_and(|(w, h)| {
        w <= MAX_IMAGE_SIDE && h <= MAX_IMAGE_SIDE && u64::from(w) * u64::from(h) <= MAX_IMAGE_PIXELS
    });
    if fits {
        Ok(())
    } else {
        Err(RenderError::TooLarge {
            width: dims.width,
            height: dims.height,
            block_size: dims.block_size,
        })
    }
}

/// Paint one block at a time; `dims` must already pass [`check_size`]
///
/// `weights` and `colors` are parallel and non-empty, with a positive sum.
fn paint<R: Rng>(weights: &[u64], colors: &[Rgb], dims: Dimensions, rng: &mut R) -> RgbImage {
    let dims = dims.clamped();
    let px = dims.block_size;
    let total: u64 = weights.iter().sum();
    let mut canvas = RgbImage::new(dims.width * px, dims.height * px);

    for row in 0..dims.height {
        for col in 0..dims.width {
            let pixel = image::Rgb(colors[pick_index(weights, rng.random_range(0..total))].to_array());
            for y in row * px..(row + 1) * px {
                for x in col * px..(col + 1) * px {
                    canvas.put_pixel(x, y, pixel);
                }
            }
        }
    }
    canvas
}

fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Weights used for drawing; all-zero becomes uniform
fn effective_weights(choices: &[Choice]) -> Vec<u64> {
    let weights: Vec<u64> = choices.iter().map(|c| u64::from(c.weight)).collect();
    if weights.iter().all(|w| *w == 0) {
        vec![1; weights.len()]
    } else {
        weights
    }
}

/// Index of the bucket containing `ticket` in the cumulative distribution
fn pick_index(weights: &[u64], ticket: u64) -> usize {
    let mut cumulative = 0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if ticket < cumulative {
            return index;
        }
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotbar_model::ColorId;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn request(choices: Vec<Choice>, w: u32, h: u32, px: u32) -> RenderRequest {
        RenderRequest::new(choices, Dimensions::new(w, h, px))
    }

    fn rgb(name: &str) -> Rgb {
        Palette::dyes().get(&ColorId::new(name)).unwrap()
    }

    fn paint_choices(choices: &[Choice], dims: Dimensions, seed: u64) -> RgbImage {
        let colors: Vec<Rgb> = choices.iter().map(|c| rgb(c.color.as_str())).collect();
        paint(
            &effective_weights(choices),
            &colors,
            dims,
            &mut StdRng::seed_from_u64(seed),
        )
    }

    fn pixel_colors(canvas: &RgbImage) -> HashSet<[u8; 3]> {
        canvas.pixels().map(|p| p.0).collect()
    }

    #[test]
    fn canvas_has_requested_shape() {
        for (w, h, px) in [(1, 1, 1), (10, 5, 2), (3, 7, 4), (20, 20, 1)] {
            let canvas = paint_choices(&[Choice::new("white", 1)], Dimensions::new(w, h, px), 7);
            assert_eq!(canvas.dimensions(), (w * px, h * px));
        }
    }

    #[test]
    fn single_color_fills_grid() {
        let canvas = paint_choices(&[Choice::new("green", 1)], Dimensions::new(5, 5, 3), 1);
        assert_eq!(pixel_colors(&canvas), HashSet::from([rgb("green").to_array()]));
    }

    #[test]
    fn zero_weight_never_drawn_when_others_positive() {
        let choices = [Choice::new("red", 0), Choice::new("blue", 5)];
        let canvas = paint_choices(&choices, Dimensions::new(8, 8, 2), 3);
        assert_eq!(pixel_colors(&canvas), HashSet::from([rgb("blue").to_array()]));
    }

    #[test]
    fn all_zero_weights_fall_back_to_uniform() {
        let choices = [
            Choice::new("red", 0),
            Choice::new("blue", 0),
            Choice::new("yellow", 0),
        ];
        let canvas = paint_choices(&choices, Dimensions::new(16, 16, 1), 3);
        assert!(pixel_colors(&canvas).len() > 1);
    }

    #[test]
    fn blocks_are_uniformly_colored() {
        let choices = [Choice::new("red", 1), Choice::new("blue", 1)];
        let canvas = paint_choices(&choices, Dimensions::new(6, 6, 4), 5);
        for (x, y, pixel) in canvas.enumerate_pixels() {
            let corner = canvas.get_pixel(x - x % 4, y - y % 4);
            assert_eq!(pixel, corner);
        }
    }

    #[test]
    fn pick_index_buckets() {
        let weights = [1, 0, 3];
        assert_eq!(pick_index(&weights, 0), 0);
        assert_eq!(pick_index(&weights, 1), 2);
        assert_eq!(pick_index(&weights, 3), 2);
    }

    #[test]
    fn size_limit_covers_area() {
        assert!(check_size(Dimensions::new(4_096, 4_096, 1)).is_ok());
        assert!(check_size(Dimensions::new(256, 256, 16)).is_ok());
        for dims in [
            Dimensions::new(16_384, 16_384, 1),
            Dimensions::new(4_097, 4_096, 1),
            Dimensions::new(1_024, 1_024, 16),
        ] {
            assert!(matches!(check_size(dims), Err(RenderError::TooLarge { .. })));
        }
    }

    proptest! {
        #[test]
        fn prop_pick_lands_on_positive_weight(
            weights in prop::collection::vec(0u64..10, 1..12),
            seed in any::<u64>(),
        ) {
            let total: u64 = weights.iter().sum();
            prop_assume!(total > 0);
            let ticket = StdRng::seed_from_u64(seed).random_range(0..total);
            let index = pick_index(&weights, ticket);
            prop_assert!(index < weights.len());
            prop_assert!(weights[index] > 0);
        }
    }

    #[tokio::test]
    async fn png_has_pixel_dimensions() {
        let renderer = GridRenderer::with_seed(Palette::dyes(), 11);
        let response = renderer
            .render(request(vec![Choice::new("pink", 1)], 6, 4, 16))
            .await
            .unwrap();

        let decoded = image::load_from_memory(&response.artifact).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (96, 64));
    }

    #[tokio::test]
    async fn minimal_image() {
        let renderer = GridRenderer::with_seed(Palette::dyes(), 11);
        let response = renderer
            .render(request(vec![Choice::new("black", 1)], 1, 1, 1))
            .await
            .unwrap();

        let decoded = image::load_from_memory(&response.artifact).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (1, 1));
        assert_eq!(decoded.get_pixel(0, 0).0, [29, 29, 33]);
    }

    #[tokio::test]
    async fn legend_is_aggregated() {
        let renderer = GridRenderer::with_seed(Palette::dyes(), 2);
        let response = renderer
            .render(request(
                vec![
                    Choice::new("red", 30),
                    Choice::new("red", 20),
                    Choice::new("blue", 50),
                ],
                4,
                4,
                16,
            ))
            .await
            .unwrap();

        let red: Vec<_> = response
            .legend
            .iter()
            .filter(|e| e.name.as_str() == "red")
            .collect();
        assert_eq!(red.len(), 1);
        assert_eq!(red[0].total_weight, 50);
    }

    #[tokio::test]
    async fn rejects_empty_and_unknown() {
        let renderer = GridRenderer::with_seed(Palette::dyes(), 2);
        assert_eq!(
            renderer.render(request(vec![], 4, 4, 16)).await,
            Err(RenderError::EmptyChoices)
        );
        assert_eq!(
            renderer
                .render(request(vec![Choice::new("nonexistent_color", 10)], 4, 4, 16))
                .await,
            Err(RenderError::UnknownColor(ColorId::new("nonexistent_color")))
        );
    }

    #[tokio::test]
    async fn rejects_oversize() {
        let renderer = GridRenderer::with_seed(Palette::dyes(), 2);
        let result = renderer
            .render(request(vec![Choice::new("red", 1)], 2048, 1, 16))
            .await;
        assert!(matches!(result, Err(RenderError::TooLarge { .. })));

        let result = renderer
            .render(request(vec![Choice::new("red", 1)], 16_384, 16_384, 1))
            .await;
        assert!(matches!(result, Err(RenderError::TooLarge { .. })));
    }

    #[tokio::test]
    async fn same_seed_same_artifact() {
        let render = |seed| async move {
            GridRenderer::with_seed(Palette::dyes(), seed)
                .render(request(
                    vec![Choice::new("red", 1), Choice::new("blue", 1)],
                    8,
                    8,
                    2,
                ))
                .await
                .unwrap()
                .artifact
        };
        assert_eq!(render(9).await, render(9).await);
    }
}
