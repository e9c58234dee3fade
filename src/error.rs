//! Error types for queue and batch-processing operations

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CutoutError>;

/// Error taxonomy for the batch background-removal engine
#[derive(Error, Debug)]
pub enum CutoutError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding errors from the image crate
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// File unreadable, unsupported format, corrupted, or over guardrail limits
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Path is already waiting in the processing queue
    #[error("Already queued: {0}")]
    DuplicateImage(PathBuf),

    /// A batch run was started with nothing to do
    #[error("Processing queue is empty")]
    EmptyQueue,

    /// The background-removal capability raised or its worker panicked
    #[error("Processing error: {0}")]
    Processing(String),

    /// I/O failure while writing a result
    #[error("Save error: {0}")]
    Save(String),

    /// The background-removal capability library is not available
    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CutoutError {
    /// Create a new invalid image error
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new save error
    pub fn save<S: Into<String>>(msg: S) -> Self {
        Self::Save(msg.into())
    }

    /// Create a new missing-dependency error
    pub fn dependency_missing<S: Into<String>>(msg: S) -> Self {
        Self::DependencyMissing(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a file I/O error with operation context
    pub fn file_io_error<P: AsRef<Path>>(operation: &str, path: P, error: &std::io::Error) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create an invalid image error with decode context
    pub fn image_load_error<P: AsRef<Path>>(path: P, error: &image::ImageError) -> Self {
        let path_ref = path.as_ref();
        let extension = path_ref
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        Self::InvalidImage(format!(
            "Failed to load '{}' (format: {}): {}. Supported formats: PNG, JPEG, BMP, GIF",
            path_ref.display(),
            extension,
            error
        ))
    }

    /// Create a save error with destination context
    pub fn save_error<P: AsRef<Path>>(path: P, details: &str) -> Self {
        Self::Save(format!(
            "Failed to write '{}': {}",
            path.as_ref().display(),
            details
        ))
    }

    /// Whether this error aborts a batch run (per-item failures never do)
    #[must_use]
    pub fn is_item_scoped(&self) -> bool {
        matches!(
            self,
            Self::InvalidImage(_) | Self::Processing(_) | Self::Save(_) | Self::Image(_)
        )
    }
}
