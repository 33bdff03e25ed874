//! Fixed 4:3 canvas with centred, overflow-scaled placement

use super::layout::{self, CanvasSpec, Layout};
use super::render;
use super::CompositionStrategy;
use crate::error::Result;
use crate::types::EncodedImage;
use tracing::debug;

/// Fit both images into a `width × round(width * 0.75)` canvas
///
/// Each image is first fitted inside the whole canvas without enlargement. If
/// the stacked pair is then taller than the canvas, both are scaled down by
/// the same factor and pinned to the top edge; otherwise the pair is centred
/// vertically. Horizontal centering always uses the dimensions of the buffer
/// that is actually composited.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAspectStrategy;

impl CompositionStrategy for FixedAspectStrategy {
    fn compose(&self, upper: &EncodedImage, lower: &EncodedImage, target_width: u32) -> Result<EncodedImage> {
        let canvas = CanvasSpec::fixed_aspect(target_width)?;

        let upper = render::decode_source(upper, "upper")?;
        let lower = render::decode_source(lower, "lower")?;
        let mut upper = render::resize_fit_inside(&upper, canvas.width, canvas.height);
        let mut lower = render::resize_fit_inside(&lower, canvas.width, canvas.height);

        let upper_dims = render::dimensions_of(&upper, "upper")?;
        let lower_dims = render::dimensions_of(&lower, "lower")?;

        let overflow = layout::overflow_heights(canvas.height, upper_dims.1, lower_dims.1);
        if let Some((upper_height, lower_height)) = overflow {
            debug!(
                total_height = upper_dims.1 + lower_dims.1,
                canvas_height = canvas.height,
                upper_height,
                lower_height,
                "combined height exceeds canvas, scaling down"
            );
            upper = render::resize_to_height(&upper, upper_height);
            lower = render::resize_to_height(&lower, lower_height);
        }

        let layout = layout::centered_layout(
            canvas,
            render::dimensions_of(&upper, "upper")?,
            render::dimensions_of(&lower, "lower")?,
            overflow.is_some(),
        )?;
        debug!(
            upper_top = layout.upper.top,
            upper_left = layout.upper.left,
            lower_top = layout.lower.top,
            lower_left = layout.lower.left,
            "fixed-aspect layout"
        );

        render::render(&layout, &upper, &lower)
    }

    fn plan(&self, upper: (u32, u32), lower: (u32, u32), target_width: u32) -> Result<Layout> {
        let canvas = CanvasSpec::fixed_aspect(target_width)?;
        let mut upper = layout::fit_inside(upper.0, upper.1, canvas.width, canvas.height);
        let mut lower = layout::fit_inside(lower.0, lower.1, canvas.width, canvas.height);

        let overflow = layout::overflow_heights(canvas.height, upper.1, lower.1);
        if let Some((upper_height, lower_height)) = overflow {
            upper = layout::scale_to_height(upper.0, upper.1, upper_height);
            lower = layout::scale_to_height(lower.0, lower.1, lower_height);
        }

        layout::centered_layout(canvas, upper, lower, overflow.is_some())
    }

    fn name(&self) -> &'static str {
        "fixed-aspect"
    }
}
