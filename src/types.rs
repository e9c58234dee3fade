//! Core data types for queue entries, processed results, and batch summaries

use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::path::PathBuf;

use crate::error::CutoutError;

/// One pending image reference awaiting processing
///
/// Order in the queue is significant: entries are processed FIFO and the
/// processed-output collection preserves enqueue order among successful
/// items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Source image path
    pub path: PathBuf,
    /// Dimensions cached from the enqueue-time probe
    pub dimensions: Option<(u32, u32)>,
}

impl QueueEntry {
    /// Create a new queue entry
    #[must_use]
    pub fn new(path: PathBuf, dimensions: Option<(u32, u32)>) -> Self {
        Self { path, dimensions }
    }

    /// File name portion of the source path, for display lists
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// An in-memory output artifact plus the source it derived from
///
/// Owned by the controller until explicitly saved or discarded.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// The result image (RGBA, background removed)
    pub image: DynamicImage,
    /// Source path the result derived from, when known
    pub source: Option<PathBuf>,
}

impl ProcessedImage {
    /// Create a new processed image artifact
    #[must_use]
    pub fn new(image: DynamicImage, source: Option<PathBuf>) -> Self {
        Self { image, source }
    }

    /// Result dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Final accounting for a batch run
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Number of entries at batch start (frozen for the run)
    pub total: usize,
    /// Items that produced a result
    pub succeeded: usize,
    /// Items that failed to load or process
    pub failed: usize,
    /// Files written by auto-save during the run
    pub saved_files: Vec<PathBuf>,
    /// Whether the run ended through cancellation
    pub cancelled: bool,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run in milliseconds
    pub total_time_ms: u64,
}

impl BatchSummary {
    /// Items accounted for so far (completed or failed)
    #[must_use]
    pub fn items_resolved(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Outcome of a batch save: saves continue after individual failures
#[derive(Debug)]
pub struct BatchSaveReport {
    /// Paths written successfully, in collection order
    pub saved: Vec<PathBuf>,
    /// Failures by collection index
    pub failed: Vec<(usize, CutoutError)>,
}

impl BatchSaveReport {
    /// Whether every file was written
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_entry_file_name() {
        let entry = QueueEntry::new(PathBuf::from("/photos/cat.png"), Some((640, 480)));
        assert_eq!(entry.file_name(), "cat.png");
        assert_eq!(entry.dimensions, Some((640, 480)));
    }

    #[test]
    fn test_processed_image_dimensions() {
        let artifact = ProcessedImage::new(DynamicImage::new_rgba8(12, 7), None);
        assert_eq!(artifact.dimensions(), (12, 7));
        assert!(artifact.source.is_none());
    }

    #[test]
    fn test_summary_accounting() {
        let summary = BatchSummary {
            total: 5,
            succeeded: 3,
            failed: 1,
            saved_files: vec![],
            cancelled: true,
            started_at: Utc::now(),
            total_time_ms: 10,
        };
        assert_eq!(summary.items_resolved(), 4);
    }
}
