//! Two-image vertical composition
//!
//! A [`CompositionStrategy`] turns an upper and a lower source image into one
//! PNG. Two implementations exist:
//!
//! - [`StackStrategy`]: both images scaled to the target width and stacked;
//!   the canvas is exactly as tall as the pair.
//! - [`FixedAspectStrategy`]: a 4:3 canvas with the pair fitted inside,
//!   downscaled on overflow and centred.
//!
//! [`StrategyKind`] selects one from configuration.

pub mod fixed_aspect;
pub mod layout;
pub mod render;
pub mod stack;

pub use fixed_aspect::FixedAspectStrategy;
pub use layout::{CanvasSpec, Channels, Layout, Placement};
pub use stack::StackStrategy;

use crate::error::{MergeError, Result};
use crate::types::EncodedImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Layout policy for placing two images on one canvas
pub trait CompositionStrategy: Send + Sync {
    /// Compose `upper` above `lower` on a canvas `target_width` pixels wide
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Composition` when either input cannot be decoded or
    /// a resized buffer has no readable dimensions.
    fn compose(&self, upper: &EncodedImage, lower: &EncodedImage, target_width: u32) -> Result<EncodedImage>;

    /// Canvas geometry and placements this strategy would use, without pixels
    ///
    /// # Errors
    ///
    /// Same conditions as [`CompositionStrategy::compose`] that do not depend
    /// on decoded pixel data.
    fn plan(&self, upper: (u32, u32), lower: (u32, u32), target_width: u32) -> Result<Layout>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Configured composition strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Stack on a 3-channel RGB canvas
    Stack,
    /// Stack on a 4-channel RGBA canvas
    StackRgba,
    /// Fixed 4:3 canvas, centred, downscaled on overflow
    FixedAspect,
}

impl Default for StrategyKind {
    fn default() -> Self {
        Self::FixedAspect
    }
}

impl StrategyKind {
    pub const ALL: [Self; 3] = [Self::Stack, Self::StackRgba, Self::FixedAspect];

    pub fn build(self) -> Arc<dyn CompositionStrategy> {
        match self {
            Self::Stack => Arc::new(StackStrategy::new(Channels::Rgb)),
            Self::StackRgba => Arc::new(StackStrategy::new(Channels::Rgba)),
            Self::FixedAspect => Arc::new(FixedAspectStrategy),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stack => write!(f, "stack"),
            Self::StackRgba => write!(f, "stack-rgba"),
            Self::FixedAspect => write!(f, "fixed-aspect"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stack" | "vertical" => Ok(Self::Stack),
            "stack-rgba" => Ok(Self::StackRgba),
            "fixed-aspect" | "4:3" => Ok(Self::FixedAspect),
            other => Err(MergeError::invalid_config(format!(
                "unknown composition strategy '{other}' (expected stack, stack-rgba or fixed-aspect)"
            ))),
        }
    }
}
