//! Threshold-based background removal
//!
//! This is not segmentation. The whole image is binarised on luminance:
//! pixels at or above the cutoff become transparent white, everything else
//! becomes black with its original alpha. Light-coloured garment content is
//! destroyed along with the background, so the result is only usable for
//! photos shot on a near-uniform white backdrop.

use crate::compose::render::encode_png;
use crate::error::{MergeError, Result};
use crate::types::{EncodedImage, ThresholdParam};
use image::{DynamicImage, Pixel, Rgba, RgbaImage};
use tracing::debug;

const FOREGROUND: [u8; 3] = [0, 0, 0];
const BACKGROUND: [u8; 3] = [255, 255, 255];

/// Binarise one RGBA pixel against `cutoff`
fn threshold_pixel(pixel: Rgba<u8>, cutoff: u8) -> Rgba<u8> {
    let luma = pixel.to_luma()[0];
    if luma >= cutoff {
        let [r, g, b] = BACKGROUND;
        Rgba([r, g, b, 0])
    } else {
        let [r, g, b] = FOREGROUND;
        Rgba([r, g, b, pixel[3]])
    }
}

/// Apply the global luminance threshold to an already decoded image
pub fn apply_threshold(image: &DynamicImage, threshold: ThresholdParam) -> RgbaImage {
    let cutoff = threshold.value();
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        *pixel = threshold_pixel(*pixel, cutoff);
    }
    rgba
}

/// Remove near-white background from an encoded image, returning a PNG with alpha
///
/// # Errors
///
/// Returns `MergeError::Threshold` when the image cannot be decoded or has no
/// readable dimensions.
pub fn remove_background(image: &EncodedImage, threshold: ThresholdParam) -> Result<EncodedImage> {
    let (width, height) = image
        .dimensions()
        .map_err(|e| MergeError::threshold(e.to_string()))?;
    let decoded = image
        .decode()
        .map_err(|e| MergeError::threshold(e.to_string()))?;

    let output = apply_threshold(&decoded, threshold);
    debug!(width, height, threshold = threshold.value(), "applied luminance threshold");

    encode_png(&DynamicImage::ImageRgba8(output)).map_err(|e| MergeError::threshold(e.to_string()))
}
