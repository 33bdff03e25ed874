//! Per-request value types shared across the pipeline

use crate::error::{MergeError, Result};
use bytes::Bytes;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::sync::OnceLock;

/// Encoded image bytes with lazily read pixel dimensions
///
/// Produced by the fetcher or by a compose/threshold step and consumed by the
/// next stage. The bytes are never mutated; the dimensions are read from the
/// image header the first time they are requested.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    bytes: Bytes,
    dimensions: OnceLock<(u32, u32)>,
}

impl EncodedImage {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            dimensions: OnceLock::new(),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Width and height in pixels, read from the header on first use
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        if let Some(dims) = self.dimensions.get() {
            return Ok(*dims);
        }

        let dims = self
            .reader()?
            .into_dimensions()
            .map_err(|e| MergeError::internal(format!("failed to read image dimensions: {e}")))?;
        if dims.0 == 0 || dims.1 == 0 {
            return Err(MergeError::internal(format!(
                "image has empty dimensions {}x{}",
                dims.0, dims.1
            )));
        }

        let _ = self.dimensions.set(dims);
        Ok(dims)
    }

    /// Decode the full image
    pub fn decode(&self) -> Result<DynamicImage> {
        let image = self
            .reader()?
            .decode()
            .map_err(|e| MergeError::internal(format!("failed to decode image: {e}")))?;
        let _ = self.dimensions.set((image.width(), image.height()));
        Ok(image)
    }

    fn reader(&self) -> Result<ImageReader<Cursor<&[u8]>>> {
        ImageReader::new(Cursor::new(self.bytes.as_ref()))
            .with_guessed_format()
            .map_err(|e| MergeError::internal(format!("failed to guess image format: {e}")))
    }
}

impl From<Vec<u8>> for EncodedImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Luminance cutoff for threshold background removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdParam(u8);

impl ThresholdParam {
    pub const DEFAULT: Self = Self(240);

    pub fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for ThresholdParam {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for ThresholdParam {
    type Error = MergeError;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value).map(Self).map_err(|_| {
            MergeError::validation(format!(
                "threshold must be an integer between 0 and 255, got {value}"
            ))
        })
    }
}

/// Kind of object written to storage, which decides the key infix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Merged,
    BackgroundRemoved,
}

/// Build a collision-resistant, time-sortable object key
///
/// `{prefix}/{unix_millis}-{uuid}.png`, or `{prefix}/nobg-{unix_millis}-{uuid}.png`
/// for background removal output.
pub fn object_key(prefix: &str, kind: ObjectKind) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let id = uuid::Uuid::new_v4();
    let prefix = prefix.trim_end_matches('/');
    let infix = match kind {
        ObjectKind::Merged => "",
        ObjectKind::BackgroundRemoved => "nobg-",
    };
    if prefix.is_empty() {
        format!("{infix}{millis}-{id}.png")
    } else {
        format!("{prefix}/{infix}{millis}-{id}.png")
    }
}
