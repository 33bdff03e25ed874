//! Error types for merge and background removal operations

use thiserror::Error;

/// Result type alias for merge service operations
pub type Result<T> = std::result::Result<T, MergeError>;

/// Every failure a request pipeline can produce.
///
/// `Validation` and `Auth` are client errors; every other variant is a
/// server-side failure surfaced as a 500 with a best-effort message.
#[derive(Error, Debug)]
pub enum MergeError {
    /// Missing or out-of-range request fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or wrong shared secret
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Fetching a source image failed (network, status or timeout)
    #[error("Failed to download image: {0}")]
    Download(String),

    /// Decoding, resizing, compositing or encoding failed
    #[error("Failed to compose images: {0}")]
    Composition(String),

    /// Threshold background removal failed
    #[error("Failed to remove background: {0}")]
    Threshold(String),

    /// Upload or signed URL request rejected by object storage
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors (socket bind, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MergeError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn auth<S: Into<String>>(msg: S) -> Self {
        Self::Auth(msg.into())
    }

    pub fn download<S: Into<String>>(msg: S) -> Self {
        Self::Download(msg.into())
    }

    pub fn composition<S: Into<String>>(msg: S) -> Self {
        Self::Composition(msg.into())
    }

    pub fn threshold<S: Into<String>>(msg: S) -> Self {
        Self::Threshold(msg.into())
    }

    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Create processing error with stage context
    pub fn composition_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Composition(format!(
            "stage '{}'{}: {}",
            stage, input_context, details
        ))
    }

    /// Create storage error from a rejected HTTP exchange
    pub fn storage_status_error(operation: &str, status: u16, body: &str) -> Self {
        let body = body.trim();
        if body.is_empty() {
            Self::Storage(format!("{} failed with status {}", operation, status))
        } else {
            Self::Storage(format!(
                "{} failed with status {}: {}",
                operation, status, body
            ))
        }
    }

    /// Whether the caller, not the service, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Auth(_))
    }
}
