//! Progress reporting service
//!
//! Separates progress presentation from the batch driver: the controller is
//! the sole producer of updates, frontends implement `ProgressReporter` to
//! render them (progress bar, status line, log output).

use crate::types::BatchSummary;
use std::path::Path;

/// Snapshot of batch progress after an item event
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Blended batch progress 0.0-100.0
    pub overall_percent: f32,
    /// Progress of the in-flight item, 0-100
    pub item_percent: u8,
    /// Items fully resolved (completed or failed) so far
    pub items_completed: usize,
    /// Items in the batch (frozen at start)
    pub items_total: usize,
    /// Display name of the in-flight item
    pub current_item: Option<String>,
    /// Elapsed time since the batch started (milliseconds)
    pub elapsed_ms: u64,
}

/// Map per-item progress into overall batch progress
///
/// `(completed / total) * 100 + (item / 100) * (100 / total)`, clamped to
/// 100 so a frozen `total` can never push the bar past full. Recomputed on
/// every item event so the bar advances smoothly across item boundaries
/// instead of jumping per item.
#[must_use]
pub fn blend_overall(items_completed: usize, items_total: usize, item_percent: u8) -> f32 {
    if items_total == 0 {
        return 0.0;
    }
    let total = items_total as f32;
    let batch_part = (items_completed as f32 / total) * 100.0;
    let item_part = (f32::from(item_percent) / 100.0) * (100.0 / total);
    (batch_part + item_part).min(100.0)
}

/// Trait for observing batch processing progress
///
/// All callbacks originate from the controller's driver; implementations
/// must be safe to call from an async context and should not block.
pub trait ProgressReporter: Send + Sync {
    /// A batch run started with `total` items
    fn on_batch_start(&self, total: usize);

    /// Processing of one item is about to begin (`index` is 0-based)
    fn on_item_start(&self, source: &Path, index: usize);

    /// Blended progress changed
    fn on_progress(&self, update: ProgressUpdate);

    /// One item finished; `saved_to` is set when auto-save wrote it
    fn on_item_complete(&self, source: &Path, saved_to: Option<&Path>);

    /// One item failed; the batch continues
    fn on_item_error(&self, source: &Path, error: &str);

    /// The run finalized, through completion or cancellation
    fn on_batch_complete(&self, summary: &BatchSummary);
}

/// No-op progress reporter that discards all updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn on_batch_start(&self, _total: usize) {}
    fn on_item_start(&self, _source: &Path, _index: usize) {}
    fn on_progress(&self, _update: ProgressUpdate) {}
    fn on_item_complete(&self, _source: &Path, _saved_to: Option<&Path>) {}
    fn on_item_error(&self, _source: &Path, _error: &str) {}
    fn on_batch_complete(&self, _summary: &BatchSummary) {}
}

/// Console progress reporter that logs batch lifecycle events
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_batch_start(&self, total: usize) {
        log::info!("Starting batch processing of {} image(s)", total);
    }

    fn on_item_start(&self, source: &Path, index: usize) {
        log::info!("[{}] Processing: {}", index + 1, source.display());
    }

    fn on_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "[{:.1}%] {}/{} - current item {}% ({}ms elapsed)",
                update.overall_percent,
                update.items_completed,
                update.items_total,
                update.item_percent,
                update.elapsed_ms
            );
        }
    }

    fn on_item_complete(&self, source: &Path, saved_to: Option<&Path>) {
        match saved_to {
            Some(path) => log::info!(
                "Completed: {} (auto-saved to {})",
                source.display(),
                path.display()
            ),
            None => log::info!("Completed: {}", source.display()),
        }
    }

    fn on_item_error(&self, source: &Path, error: &str) {
        log::error!("Failed: {} - {}", source.display(), error);
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        if summary.cancelled {
            log::info!(
                "Batch cancelled: {}/{} resolved in {:.2}s",
                summary.items_resolved(),
                summary.total,
                summary.total_time_ms as f64 / 1000.0
            );
        } else {
            log::info!(
                "Batch complete: {}/{} successful in {:.2}s",
                summary.succeeded,
                summary.total,
                summary.total_time_ms as f64 / 1000.0
            );
        }
        if summary.failed > 0 {
            log::warn!("  {} image(s) failed processing", summary.failed);
        }
    }
}
