//! Shared helpers for integration tests: in-memory images and stub collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use garment_merge::{
    EncodedImage, ImageSource, MergeError, MergeService, ObjectStore, Result, ServiceConfig,
    StrategyKind,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_KEY: &str = "test-merge-key";

/// Encode an image as PNG bytes
pub fn encode(image: &DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Solid RGB PNG
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb(color),
    )))
}

/// RGB PNG with a horizontal gradient, so resampling produces varied pixels
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    encode(&DynamicImage::ImageRgb8(image))
}

/// Fully transparent RGBA PNG
pub fn transparent_png(width: u32, height: u32) -> Vec<u8> {
    encode(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([0, 0, 0, 0]),
    )))
}

pub fn encoded(bytes: Vec<u8>) -> EncodedImage {
    EncodedImage::new(bytes)
}

/// Image source serving fixed bytes per URL and counting calls
#[derive(Default)]
pub struct StubSource {
    images: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSource for StubSource {
    async fn fetch(&self, url: &str) -> Result<EncodedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.images
            .get(url)
            .map(|bytes| EncodedImage::new(bytes.clone()))
            .ok_or_else(|| MergeError::download(format!("upstream responded with status 404 for {url}")))
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub bytes: Bytes,
    pub content_type: String,
    pub upsert: bool,
}

/// Object store keeping uploads in memory
#[derive(Default)]
pub struct RecordingStore {
    pub uploads: Mutex<Vec<Upload>>,
    pub signed: Mutex<Vec<(String, Duration)>>,
    pub fail_upload: bool,
    pub fail_sign: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }

    pub fn failing_sign() -> Self {
        Self {
            fail_sign: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn signed(&self) -> Vec<(String, Duration)> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn upload(&self, bucket: &str, key: &str, bytes: Bytes, content_type: &str, upsert: bool) -> Result<()> {
        if self.fail_upload {
            return Err(MergeError::storage_status_error("upload", 403, "forbidden"));
        }
        self.uploads.lock().unwrap().push(Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            bytes,
            content_type: content_type.to_string(),
            upsert,
        });
        Ok(())
    }

    async fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        if self.fail_sign {
            return Err(MergeError::storage_status_error("sign", 500, "sign failed"));
        }
        self.signed.lock().unwrap().push((key.to_string(), ttl));
        Ok(format!("https://storage.test/{bucket}/{key}?token=signed"))
    }
}

pub fn test_config(strategy: StrategyKind) -> ServiceConfig {
    ServiceConfig::builder()
        .api_key(API_KEY)
        .storage("https://storage.test", "service-key")
        .strategy(strategy)
        .build()
        .unwrap()
}

pub fn service_with(
    strategy: StrategyKind,
    source: Arc<StubSource>,
    store: Arc<RecordingStore>,
) -> MergeService {
    MergeService::new(test_config(strategy), source, store)
}
