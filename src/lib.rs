#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Garment Merge
//!
//! A small HTTP service that downloads an upper and a lower garment image,
//! stacks them on a white canvas, uploads the PNG to object storage and hands
//! back a time-limited signed URL. A second endpoint applies a blunt luminance
//! threshold to turn a near-white backdrop transparent.
//!
//! ## Layout
//!
//! - [`fetch`]: bounded-timeout image download behind [`ImageSource`]
//! - [`compose`]: the two [`CompositionStrategy`] implementations and their geometry
//! - [`threshold`]: threshold background removal
//! - [`storage`]: upload and signed URLs behind [`ObjectStore`]
//! - [`service`]: the request pipeline, independent of HTTP
//! - [`server`]: axum router, API-key check and JSON errors
//!
//! ## Composing without the server
//!
//! ```rust,no_run
//! use garment_merge::{EncodedImage, StrategyKind};
//!
//! # fn example(upper: Vec<u8>, lower: Vec<u8>) -> garment_merge::Result<()> {
//! let strategy = StrategyKind::FixedAspect.build();
//! let merged = strategy.compose(&EncodedImage::new(upper), &EncodedImage::new(lower), 1024)?;
//! assert_eq!(merged.dimensions()?, (1024, 768));
//! # Ok(())
//! # }
//! ```
//!
//! ## Running the service
//!
//! ```rust,no_run
//! use garment_merge::{server, MergeService, ServiceConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::builder()
//!     .api_key("shared-secret")
//!     .storage("https://project.supabase.co", "service-role-key")
//!     .build()?;
//! let service = MergeService::from_config(config)?;
//! server::serve(service, "0.0.0.0:4000".parse()?).await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod fetch;
pub mod server;
pub mod service;
pub mod storage;
pub mod threshold;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

pub use compose::{
    CanvasSpec, Channels, CompositionStrategy, FixedAspectStrategy, Layout, Placement,
    StackStrategy, StrategyKind,
};
pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{MergeError, Result};
pub use fetch::{HttpImageFetcher, ImageSource};
pub use service::MergeService;
pub use storage::{ObjectStore, StorageConfig, SupabaseStorage};
pub use threshold::remove_background;
pub use types::{object_key, EncodedImage, ObjectKind, ThresholdParam};

#[cfg(feature = "cli")]
pub use tracing_config::{init_service_tracing, TracingConfig, TracingFormat};
