//! Canvas and placement geometry
//!
//! Pure arithmetic with no pixel access, so every layout rule can be checked
//! without decoding an image.

use crate::error::{MergeError, Result};

/// Height-to-width ratio of the fixed-aspect canvas (4:3 landscape)
pub const FIXED_ASPECT_RATIO: f64 = 0.75;

/// Canvas width bounds accepted from configuration
pub const MIN_TARGET_WIDTH: u32 = 16;
pub const MAX_TARGET_WIDTH: u32 = 8192;

/// Largest canvas accepted, matching the 512 MiB allocation cap `image`
/// applies to decoding when spent on 4-byte RGBA pixels
pub const MAX_CANVAS_PIXELS: u64 = 512 * 1024 * 1024 / 4;

/// Channel layout of the output canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Rgb,
    Rgba,
}

/// Target canvas; the background is always opaque white
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
}

impl CanvasSpec {
    pub const BACKGROUND: [u8; 4] = [255, 255, 255, 255];

    pub fn new(width: u32, height: u32, channels: Channels) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MergeError::composition(format!(
                "canvas dimensions must be positive, got {width}x{height}"
            )));
        }
        if u64::from(width) * u64::from(height) > MAX_CANVAS_PIXELS {
            return Err(MergeError::composition(format!(
                "canvas {width}x{height} exceeds the {MAX_CANVAS_PIXELS} pixel limit"
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
        })
    }

    /// Stack canvas: `target_width` wide, exactly as tall as both images
    pub fn stacked(target_width: u32, upper_height: u32, lower_height: u32, channels: Channels) -> Result<Self> {
        let height = upper_height.checked_add(lower_height).ok_or_else(|| {
            MergeError::composition("combined image height overflows the canvas")
        })?;
        Self::new(target_width, height, channels)
    }

    /// Fixed 4:3 canvas: `target_width × round(target_width * 0.75)`, RGBA
    pub fn fixed_aspect(target_width: u32) -> Result<Self> {
        Self::new(target_width, fixed_aspect_height(target_width), Channels::Rgba)
    }
}

/// Where one source image lands on the canvas, and how large it is there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn fits_within(&self, canvas: &CanvasSpec) -> bool {
        u64::from(self.left) + u64::from(self.width) <= u64::from(canvas.width)
            && u64::from(self.top) + u64::from(self.height) <= u64::from(canvas.height)
    }
}

/// Canvas plus the placements of the upper and lower images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub canvas: CanvasSpec,
    pub upper: Placement,
    pub lower: Placement,
}

impl Layout {
    /// Reject any placement that would spill past the canvas edge
    pub fn ensure_in_bounds(&self) -> Result<()> {
        for (name, placement) in [("upper", &self.upper), ("lower", &self.lower)] {
            if !placement.fits_within(&self.canvas) {
                return Err(MergeError::composition(format!(
                    "{name} image {}x{} at ({}, {}) exceeds canvas {}x{}",
                    placement.width,
                    placement.height,
                    placement.top,
                    placement.left,
                    self.canvas.width,
                    self.canvas.height
                )));
            }
        }
        Ok(())
    }
}

pub fn fixed_aspect_height(width: u32) -> u32 {
    (f64::from(width) * FIXED_ASPECT_RATIO).round() as u32
}

fn scale_dimension(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (f64::from(value) * f64::from(numerator) / f64::from(denominator)).round();
    (scaled as u32).max(1)
}

/// Size after resizing to exactly `target_width`, keeping the aspect ratio
pub fn scale_to_width(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    (target_width, scale_dimension(height, target_width, width))
}

/// Size after resizing to exactly `target_height`, keeping the aspect ratio
pub fn scale_to_height(width: u32, height: u32, target_height: u32) -> (u32, u32) {
    (scale_dimension(width, target_height, height), target_height)
}

/// Size after a fit-inside resize that never enlarges
pub fn fit_inside(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let width_ratio = f64::from(max_width) / f64::from(width);
    let height_ratio = f64::from(max_height) / f64::from(height);
    if width_ratio <= height_ratio {
        scale_to_width(width, height, max_width)
    } else {
        let (w, h) = scale_to_height(width, height, max_height);
        (w.min(max_width), h)
    }
}

/// Horizontal or vertical centering offset, `floor((outer - inner) / 2)`
pub fn center_offset(outer: u32, inner: u32) -> u32 {
    outer.saturating_sub(inner) / 2
}

/// Heights both images must shrink to when the stacked pair is taller than
/// the canvas, or `None` when it already fits.
///
/// Each height is rounded independently, so the pair can round one pixel past
/// the canvas; the lower image gives up that pixel.
pub fn overflow_heights(canvas_height: u32, upper_height: u32, lower_height: u32) -> Option<(u32, u32)> {
    let total = u64::from(upper_height) + u64::from(lower_height);
    if total <= u64::from(canvas_height) {
        return None;
    }

    let scale = f64::from(canvas_height) / total as f64;
    let upper = ((f64::from(upper_height) * scale).round() as u32).clamp(1, canvas_height);
    let lower = ((f64::from(lower_height) * scale).round() as u32)
        .min(canvas_height.saturating_sub(upper))
        .max(1);
    Some((upper, lower))
}

/// Plain stack: upper at the origin, lower directly beneath it
pub fn stack_layout(target_width: u32, upper: (u32, u32), lower: (u32, u32), channels: Channels) -> Result<Layout> {
    let canvas = CanvasSpec::stacked(target_width, upper.1, lower.1, channels)?;
    let layout = Layout {
        canvas,
        upper: Placement {
            top: 0,
            left: 0,
            width: upper.0,
            height: upper.1,
        },
        lower: Placement {
            top: upper.1,
            left: 0,
            width: lower.0,
            height: lower.1,
        },
    };
    layout.ensure_in_bounds()?;
    Ok(layout)
}

/// Fixed-aspect stack, centred horizontally against the buffers placed
///
/// `overflowed` selects the branch: after an overflow downscale the pair is
/// pinned to the top edge, otherwise the pair is centred vertically as a block.
pub fn centered_layout(canvas: CanvasSpec, upper: (u32, u32), lower: (u32, u32), overflowed: bool) -> Result<Layout> {
    let top = if overflowed {
        0
    } else {
        center_offset(canvas.height, upper.1.saturating_add(lower.1))
    };

    let layout = Layout {
        canvas,
        upper: Placement {
            top,
            left: center_offset(canvas.width, upper.0),
            width: upper.0,
            height: upper.1,
        },
        lower: Placement {
            top: top + upper.1,
            left: center_offset(canvas.width, lower.0),
            width: lower.0,
            height: lower.1,
        },
    };
    layout.ensure_in_bounds()?;
    Ok(layout)
}
