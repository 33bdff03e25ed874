//! Plain vertical stack at a fixed width

use super::layout::{self, Channels, Layout};
use super::render;
use super::CompositionStrategy;
use crate::error::Result;
use crate::types::EncodedImage;
use tracing::debug;

/// Resize both images to the target width and stack them
///
/// The canvas is as tall as the two resized images combined. Images narrower
/// than the target are enlarged.
#[derive(Debug, Clone, Copy)]
pub struct StackStrategy {
    channels: Channels,
}

impl StackStrategy {
    pub fn new(channels: Channels) -> Self {
        Self { channels }
    }
}

impl CompositionStrategy for StackStrategy {
    fn compose(&self, upper: &EncodedImage, lower: &EncodedImage, target_width: u32) -> Result<EncodedImage> {
        let upper = render::decode_source(upper, "upper")?;
        let lower = render::decode_source(lower, "lower")?;

        // Canvas limits are checked against the source sizes, before any resize
        let layout = self.plan(
            render::dimensions_of(&upper, "upper")?,
            render::dimensions_of(&lower, "lower")?,
            target_width,
        )?;
        debug!(
            canvas_width = layout.canvas.width,
            canvas_height = layout.canvas.height,
            lower_top = layout.lower.top,
            "stack layout"
        );

        let upper = render::resize_to_width(&upper, target_width);
        let lower = render::resize_to_width(&lower, target_width);
        render::render(&layout, &upper, &lower)
    }

    fn plan(&self, upper: (u32, u32), lower: (u32, u32), target_width: u32) -> Result<Layout> {
        let upper = layout::scale_to_width(upper.0, upper.1, target_width);
        let lower = layout::scale_to_width(lower.0, lower.1, target_width);
        layout::stack_layout(target_width, upper, lower, self.channels)
    }

    fn name(&self) -> &'static str {
        match self.channels {
            Channels::Rgb => "stack",
            Channels::Rgba => "stack-rgba",
        }
    }
}
