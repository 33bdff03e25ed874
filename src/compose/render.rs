//! Pixel operations: decode, resize, composite and PNG encoding

use super::layout::{self, CanvasSpec, Channels, Layout};
use crate::error::{MergeError, Result};
use crate::types::EncodedImage;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Decode a source image, attributing failures to the composition stage
pub(crate) fn decode_source(image: &EncodedImage, name: &str) -> Result<DynamicImage> {
    image.decode().map_err(|e| {
        MergeError::composition_stage_error(
            "decode",
            &e.to_string(),
            Some(&format!("{name}, {} bytes", image.len())),
        )
    })
}

fn resize_exact(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    image.resize_exact(width, height, RESIZE_FILTER)
}

pub fn resize_to_width(image: &DynamicImage, target_width: u32) -> DynamicImage {
    let (width, height) = layout::scale_to_width(image.width(), image.height(), target_width);
    resize_exact(image, width, height)
}

pub fn resize_to_height(image: &DynamicImage, target_height: u32) -> DynamicImage {
    let (width, height) = layout::scale_to_height(image.width(), image.height(), target_height);
    resize_exact(image, width, height)
}

pub fn resize_fit_inside(image: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = layout::fit_inside(image.width(), image.height(), max_width, max_height);
    resize_exact(image, width, height)
}

/// Width and height of a resized buffer, failing on an empty image
pub(crate) fn dimensions_of(image: &DynamicImage, name: &str) -> Result<(u32, u32)> {
    let dims = (image.width(), image.height());
    if dims.0 == 0 || dims.1 == 0 {
        return Err(MergeError::composition_stage_error(
            "metadata",
            "resized image has no height",
            Some(name),
        ));
    }
    Ok(dims)
}

/// Paint both images onto a fresh white canvas and encode it as PNG
///
/// Placement sizes must match the buffers; source alpha is blended over the
/// background. An RGB canvas is composited in RGBA and flattened afterwards,
/// which is exact because the background is opaque.
pub fn render(layout: &Layout, upper: &DynamicImage, lower: &DynamicImage) -> Result<EncodedImage> {
    layout.ensure_in_bounds()?;

    let CanvasSpec {
        width,
        height,
        channels,
    } = layout.canvas;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba(CanvasSpec::BACKGROUND));

    for (name, image, placement) in [
        ("upper", upper, &layout.upper),
        ("lower", lower, &layout.lower),
    ] {
        if (image.width(), image.height()) != (placement.width, placement.height) {
            return Err(MergeError::composition_stage_error(
                "composite",
                &format!(
                    "buffer is {}x{} but placement expects {}x{}",
                    image.width(),
                    image.height(),
                    placement.width,
                    placement.height
                ),
                Some(name),
            ));
        }
        imageops::overlay(
            &mut canvas,
            &image.to_rgba8(),
            i64::from(placement.left),
            i64::from(placement.top),
        );
    }

    let output = match channels {
        Channels::Rgba => DynamicImage::ImageRgba8(canvas),
        Channels::Rgb => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()),
    };
    encode_png(&output).map_err(|e| MergeError::composition_stage_error("encode", &e.to_string(), None))
}

pub fn encode_png(image: &DynamicImage) -> Result<EncodedImage> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| MergeError::internal(format!("PNG encoding failed: {e}")))?;
    Ok(EncodedImage::new(buffer.into_inner()))
}
