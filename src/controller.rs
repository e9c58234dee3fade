//! Batch queue controller
//!
//! The coordination core of the application: an ordered queue of pending
//! images, a sequential driver that feeds them one at a time through the
//! async job runner, blended batch progress, cooperative cancellation, and
//! per-item auto-save.
//!
//! Threading model: all queue and counter state lives behind one mutex that
//! is only held for short, non-awaiting sections. The blocking worker owns
//! nothing but the image it was handed by value, so results cross the thread
//! boundary through the job event channel and never race controller state.

use crate::{
    config::{EngineConfig, OutputFormat},
    error::{CutoutError, Result},
    remover::BackgroundRemover,
    runner::{spawn_removal, JobEvent},
    services::{
        format::OutputFormatHandler,
        io::ImageIoService,
        naming,
        progress::{blend_overall, NoOpProgressReporter, ProgressReporter, ProgressUpdate},
    },
    types::{BatchSaveReport, BatchSummary, ProcessedImage, QueueEntry},
};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use instant::Instant;
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Supplies the output directory for auto-saving batch runs
///
/// This is the `AwaitingOutputDir` collaborator: a GUI frontend shows a
/// directory picker here; returning `None` means the user declined and the
/// run is not started.
pub trait OutputDirectoryProvider: Send + Sync {
    /// Ask for the directory processed images should be auto-saved into
    fn request_output_directory(&self) -> Option<PathBuf>;
}

/// Provider that always supplies a fixed directory (headless use, tests)
pub struct FixedOutputDirectory(pub PathBuf);

impl OutputDirectoryProvider for FixedOutputDirectory {
    fn request_output_directory(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Provider that always declines, keeping runs auto-save-free
pub struct NoOutputDirectory;

impl OutputDirectoryProvider for NoOutputDirectory {
    fn request_output_directory(&self) -> Option<PathBuf> {
        None
    }
}

/// Bookkeeping for an in-progress batch run
///
/// `total` is frozen when the run starts; entries enqueued while the run is
/// active wait for the next run, so `current <= total` always holds and the
/// progress denominator never drifts.
#[derive(Debug, Clone)]
pub struct BatchState {
    total: usize,
    current: usize,
    output_dir: Option<PathBuf>,
    cancel: CancellationToken,
    started_at: DateTime<Utc>,
}

impl BatchState {
    /// Entry count at batch start, immutable for the run
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Items resolved so far (completed or failed)
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Auto-save target directory, when the run has one
    #[must_use]
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Whether cancellation has been requested for this run
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// When this run started
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Controller lifecycle as a tagged state
///
/// `current` cannot exist without `total`: run counters only exist inside
/// `Running`/`Cancelling`.
#[derive(Debug, Clone)]
pub enum ControllerState {
    /// No run active; queue may be filled
    Idle,
    /// Waiting for the output-directory provider to answer
    AwaitingOutputDir,
    /// A batch run is processing items
    Running(BatchState),
    /// Cancellation requested; takes effect at the next item boundary
    Cancelling(BatchState),
}

impl ControllerState {
    /// Whether a run is active (including one that is winding down)
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::AwaitingOutputDir | Self::Running(_) | Self::Cancelling(_)
        )
    }
}

struct ControllerInner {
    state: ControllerState,
    queue: VecDeque<QueueEntry>,
    processed: Vec<ProcessedImage>,
}

/// Batch queue controller
///
/// Owns the pending queue and the processed-output collection, and drives
/// sequential batch runs. Methods take `&self`; the controller can be shared
/// with a UI task that keeps calling `enqueue`/`cancel` while `start` is in
/// flight.
pub struct BatchController {
    inner: Arc<Mutex<ControllerInner>>,
    remover: Arc<dyn BackgroundRemover>,
    reporter: Arc<dyn ProgressReporter>,
    dir_provider: Arc<dyn OutputDirectoryProvider>,
    config: EngineConfig,
}

impl BatchController {
    /// Create a controller around an injected background-removal capability
    ///
    /// Starts with a no-op progress reporter and a declining output-directory
    /// provider; use [`with_reporter`](Self::with_reporter) and
    /// [`with_output_directory_provider`](Self::with_output_directory_provider)
    /// to wire the frontend in.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the configuration fails validation.
    pub fn new(remover: Arc<dyn BackgroundRemover>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Mutex::new(ControllerInner {
                state: ControllerState::Idle,
                queue: VecDeque::new(),
                processed: Vec::new(),
            })),
            remover,
            reporter: Arc::new(NoOpProgressReporter),
            dir_provider: Arc::new(NoOutputDirectory),
            config,
        })
    }

    /// Attach a progress reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Attach an output-directory provider for auto-saving runs
    #[must_use]
    pub fn with_output_directory_provider(
        mut self,
        provider: Arc<dyn OutputDirectoryProvider>,
    ) -> Self {
        self.dir_provider = provider;
        self
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current controller state snapshot
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.lock().state.clone()
    }

    /// Snapshot of pending queue entries, in processing order
    #[must_use]
    pub fn queued(&self) -> Vec<QueueEntry> {
        self.lock().queue.iter().cloned().collect()
    }

    /// Number of pending queue entries
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of processed results held by the controller
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.lock().processed.len()
    }

    /// Most recent processed result, for previews
    #[must_use]
    pub fn last_processed(&self) -> Option<ProcessedImage> {
        self.lock().processed.last().cloned()
    }

    /// Snapshot of all processed results, in completion order
    ///
    /// Completion order equals enqueue order among items that succeeded;
    /// failed items leave no gap, they are simply absent.
    #[must_use]
    pub fn processed(&self) -> Vec<ProcessedImage> {
        self.lock().processed.clone()
    }

    /// Validate a source file and append it to the processing queue
    ///
    /// Probes the file header for decodability and dimensions, applies the
    /// configured guardrails, and rejects paths already queued. This is the
    /// one mutator that is legal while a run is active; entries added
    /// mid-run wait for the next run.
    ///
    /// # Errors
    /// * `InvalidImage` - unreadable, undecodable, or over guardrail limits
    /// * `DuplicateImage` - the path is already waiting in the queue
    pub fn enqueue<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref().to_path_buf();

        let info = ImageIoService::probe_source(&path)?;

        if let Some(guardrails) = &self.config.guardrails {
            if info.file_bytes > guardrails.max_file_bytes {
                return Err(CutoutError::invalid_image(format!(
                    "'{}' is {} bytes, over the {} byte limit",
                    path.display(),
                    info.file_bytes,
                    guardrails.max_file_bytes
                )));
            }
            let (max_w, max_h) = guardrails.max_dimensions;
            let (w, h) = info.dimensions;
            if w > max_w || h > max_h {
                return Err(CutoutError::invalid_image(format!(
                    "'{}' is {}x{}, over the {}x{} limit",
                    path.display(),
                    w,
                    h,
                    max_w,
                    max_h
                )));
            }
        }

        let mut inner = self.lock();
        if inner.queue.iter().any(|entry| entry.path == path) {
            return Err(CutoutError::DuplicateImage(path));
        }
        debug!(path = %path.display(), width = info.dimensions.0, height = info.dimensions.1, "enqueued");
        inner
            .queue
            .push_back(QueueEntry::new(path, Some(info.dimensions)));
        Ok(())
    }

    /// Remove one pending entry by path
    ///
    /// Refused while a run is active; the queue is immutable mid-run except
    /// for `enqueue`. Returns whether an entry was removed.
    pub fn remove<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        let mut inner = self.lock();
        if inner.state.is_busy() {
            return false;
        }
        let before = inner.queue.len();
        inner.queue.retain(|entry| entry.path != path);
        inner.queue.len() != before
    }

    /// Clear all pending entries
    ///
    /// During a run this first requests cancellation (the in-flight item
    /// still finishes), then drops the pending entries. Processed results
    /// and already-saved files are untouched.
    pub fn clear(&self) {
        {
            let inner = self.lock();
            if matches!(inner.state, ControllerState::Running(_)) {
                drop(inner);
                self.cancel();
            }
        }
        let mut inner = self.lock();
        inner.queue.clear();
        info!("queue cleared");
    }

    /// Request cancellation of the active run
    ///
    /// Cooperative: the in-flight item is never aborted (the capability has
    /// no cancellation hook); the run stops at the next item boundary, so
    /// cancellation latency is bounded by the current item's remaining
    /// processing time. Entries not yet started stay queued.
    pub fn cancel(&self) {
        let mut inner = self.lock();
        if let ControllerState::Running(batch) = &inner.state {
            batch.cancel.cancel();
            info!(
                completed = batch.current,
                total = batch.total,
                "cancellation requested"
            );
            let batch = batch.clone();
            inner.state = ControllerState::Cancelling(batch);
        }
    }

    /// Start a batch run and drive it to completion or cancellation
    ///
    /// No-op (`Ok(None)`) when a run is already active. For auto-saving
    /// multi-item batches the output-directory provider is consulted first;
    /// a decline returns `Ok(None)` with the queue untouched. Otherwise
    /// processes entries FIFO: per-item failures are reported and counted
    /// but never abort the run, so the batch always terminates with
    /// `current == total` unless cancelled.
    ///
    /// # Errors
    /// * `EmptyQueue` - nothing is queued; controller state is unchanged
    /// * `DependencyMissing` - the capability reports itself unavailable
    pub async fn start(&self) -> Result<Option<BatchSummary>> {
        let batch = match self.prepare_run()? {
            Some(batch) => batch,
            None => return Ok(None),
        };

        info!(total = batch.total, auto_save = batch.output_dir.is_some(), "batch started");
        self.reporter.on_batch_start(batch.total);

        let run_start = Instant::now();
        let cancel = batch.cancel.clone();
        let output_dir = batch.output_dir.clone();
        let total = batch.total;
        let started_at = batch.started_at;

        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut saved_files: Vec<PathBuf> = Vec::new();

        for index in 0..total {
            // Cancellation takes effect only at item boundaries.
            if cancel.is_cancelled() {
                break;
            }

            let Some(entry) = self.lock().queue.pop_front() else {
                break;
            };

            self.reporter.on_item_start(&entry.path, index);
            // Synthetic milestone: the capability reports nothing until it
            // finishes, so the bar resets visibly at each item start.
            self.report_progress(succeeded + failed, total, 0, &entry, run_start);

            let image = match ImageIoService::load_image(&entry.path) {
                Ok(image) => image,
                Err(e) => {
                    failed += 1;
                    self.advance_current();
                    self.reporter.on_item_error(&entry.path, &e.to_string());
                    continue;
                },
            };

            let outcome = self
                .run_item(image, &entry, succeeded + failed, total, run_start, &cancel)
                .await;

            if cancel.is_cancelled() {
                // A result that lands after cancellation is discarded, the
                // same as the original's guarded completion callback.
                break;
            }

            match outcome {
                Ok(result) => {
                    let artifact = ProcessedImage::new(result, Some(entry.path.clone()));
                    let saved_to = match &output_dir {
                        Some(dir) => self.auto_save(&artifact, dir, succeeded + failed),
                        None => None,
                    };
                    if let Some(path) = &saved_to {
                        saved_files.push(path.clone());
                    }
                    {
                        let mut inner = self.lock();
                        inner.processed.push(artifact);
                    }
                    succeeded += 1;
                    self.advance_current();
                    self.reporter
                        .on_item_complete(&entry.path, saved_to.as_deref());
                },
                Err(e) => {
                    failed += 1;
                    self.advance_current();
                    self.reporter.on_item_error(&entry.path, &e.to_string());
                },
            }
        }

        let summary = BatchSummary {
            total,
            succeeded,
            failed,
            saved_files,
            cancelled: cancel.is_cancelled(),
            started_at,
            total_time_ms: run_start.elapsed().as_millis() as u64,
        };

        {
            let mut inner = self.lock();
            inner.state = ControllerState::Idle;
        }
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "batch finalized"
        );
        self.reporter.on_batch_complete(&summary);

        Ok(Some(summary))
    }

    /// Save the most recent result to an explicit path
    ///
    /// The format follows the path's extension: `.jpg`/`.jpeg` flattens onto
    /// white at the configured quality, anything else writes PNG with alpha.
    ///
    /// # Errors
    /// * `EmptyQueue` - no processed result exists yet
    /// * `Save` - the write failed
    pub fn save_single<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let artifact = self.last_processed().ok_or(CutoutError::EmptyQueue)?;
        let path = path.as_ref();

        let format = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
                OutputFormat::Jpeg
            },
            _ => OutputFormat::Png,
        };
        let converted = OutputFormatHandler::convert_format(artifact.image.to_rgba8(), format);
        ImageIoService::save_image(&converted, path, format, self.config.jpeg_quality)
    }

    /// Save every processed result into `dir` using a naming pattern
    ///
    /// The pattern's `{index}` placeholder is substituted with the 1-based
    /// collection index (appended as `_{index}` when absent). A write
    /// failure does not stop the loop; the report lists saved paths and
    /// per-index failures so callers can surface partial success.
    pub fn save_all<P: AsRef<Path>>(
        &self,
        dir: P,
        pattern: &str,
        format: OutputFormat,
    ) -> BatchSaveReport {
        let dir = dir.as_ref();
        let artifacts: Vec<ProcessedImage> = self.lock().processed.clone();

        let mut report = BatchSaveReport {
            saved: Vec::new(),
            failed: Vec::new(),
        };

        OutputFormatHandler::validate_for_background_removal(format);

        for (index, artifact) in artifacts.iter().enumerate() {
            let base_name = naming::apply_pattern(pattern, index + 1);
            let file_name = format!("{}.{}", base_name, OutputFormatHandler::extension(format));
            let path = dir.join(file_name);

            let converted = OutputFormatHandler::convert_format(artifact.image.to_rgba8(), format);
            match ImageIoService::save_image(&converted, &path, format, self.config.jpeg_quality) {
                Ok(()) => report.saved.push(path),
                Err(e) => {
                    warn!(index, error = %e, "batch save failed for one file, continuing");
                    report.failed.push((index, e));
                },
            }
        }

        report
    }

    /// Drop all processed results, releasing their memory
    pub fn discard_processed(&self) {
        self.lock().processed.clear();
    }

    // Validates preconditions and transitions Idle -> Running, consulting
    // the output-directory provider when the run will auto-save.
    fn prepare_run(&self) -> Result<Option<BatchState>> {
        let needs_output_dir = {
            let mut inner = self.lock();
            if inner.state.is_busy() {
                return Ok(None);
            }
            if inner.queue.is_empty() {
                return Err(CutoutError::EmptyQueue);
            }
            if !self.remover.is_available() {
                return Err(CutoutError::dependency_missing(format!(
                    "background-removal capability '{}' is not available",
                    self.remover.name()
                )));
            }

            let needs_output_dir = self.config.auto_save && inner.queue.len() > 1;
            if needs_output_dir {
                inner.state = ControllerState::AwaitingOutputDir;
            }
            needs_output_dir
        };

        let output_dir = if needs_output_dir {
            // Provider may block on a dialog; the lock is released so
            // enqueue keeps working meanwhile.
            match self.dir_provider.request_output_directory() {
                Some(dir) => Some(dir),
                None => {
                    let mut inner = self.lock();
                    inner.state = ControllerState::Idle;
                    debug!("output directory declined, run not started");
                    return Ok(None);
                },
            }
        } else {
            None
        };

        let mut inner = self.lock();
        let batch = BatchState {
            total: inner.queue.len(),
            current: 0,
            output_dir,
            cancel: CancellationToken::new(),
            started_at: Utc::now(),
        };
        inner.state = ControllerState::Running(batch.clone());
        Ok(Some(batch))
    }

    // Dispatches one item to the job runner and drains its event channel.
    // The channel fully resolves before the next item is dispatched.
    async fn run_item(
        &self,
        image: DynamicImage,
        entry: &QueueEntry,
        items_resolved: usize,
        total: usize,
        run_start: Instant,
        cancel: &CancellationToken,
    ) -> Result<DynamicImage> {
        let mut handle = spawn_removal(self.remover.clone(), image);

        let mut result: Option<DynamicImage> = None;
        let mut error: Option<CutoutError> = None;

        while let Some(event) = handle.next_event().await {
            match event {
                JobEvent::Progress(percent) => {
                    if !cancel.is_cancelled() {
                        self.report_progress(items_resolved, total, percent, entry, run_start);
                    }
                },
                JobEvent::Complete(output) => result = Some(output),
                JobEvent::Failed(e) => error = Some(e),
            }
        }

        match (result, error) {
            (Some(output), None) => Ok(output),
            (_, Some(e)) => Err(e),
            (None, None) => Err(CutoutError::processing(
                "removal job ended without a completion event",
            )),
        }
    }

    fn report_progress(
        &self,
        items_resolved: usize,
        total: usize,
        item_percent: u8,
        entry: &QueueEntry,
        run_start: Instant,
    ) {
        self.reporter.on_progress(ProgressUpdate {
            overall_percent: blend_overall(items_resolved, total, item_percent),
            item_percent,
            items_completed: items_resolved,
            items_total: total,
            current_item: Some(entry.file_name()),
            elapsed_ms: run_start.elapsed().as_millis() as u64,
        });
    }

    // Auto-save one artifact; failures are logged and reported but never
    // interrupt the run.
    fn auto_save(&self, artifact: &ProcessedImage, dir: &Path, index: usize) -> Option<PathBuf> {
        let name = naming::auto_save_name(artifact.source.as_deref(), index);
        let target = naming::resolve_collision(&dir.join(name));

        match ImageIoService::save_image(
            &artifact.image,
            &target,
            OutputFormat::Png,
            self.config.jpeg_quality,
        ) {
            Ok(()) => Some(target),
            Err(e) => {
                warn!(path = %target.display(), error = %e, "auto-save failed");
                if let Some(source) = &artifact.source {
                    self.reporter
                        .on_item_error(source, &format!("auto-save failed: {e}"));
                }
                None
            },
        }
    }

    fn advance_current(&self) {
        let mut inner = self.lock();
        match &mut inner.state {
            ControllerState::Running(batch) | ControllerState::Cancelling(batch) => {
                batch.current += 1;
            },
            _ => {},
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerInner> {
        self.inner.lock().expect("controller state lock poisoned")
    }
}
