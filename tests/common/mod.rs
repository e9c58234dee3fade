//! Shared fixtures for integration tests: temp image files, mock removal
//! capabilities, and a recording progress reporter.

#![allow(dead_code)]
#![allow(unreachable_pub)]

use cutout::{BackgroundRemover, BatchSummary, CutoutError, ProgressReporter, ProgressUpdate};
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Write a small valid PNG and return its path
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::new_rgba8(width, height)
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("failed to write test PNG");
    path
}

/// Initialize test logging once; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Capability stub that returns the input as RGBA, counting invocations
#[derive(Default)]
pub struct PassthroughRemover {
    pub calls: AtomicUsize,
}

impl BackgroundRemover for PassthroughRemover {
    fn remove_background(&self, image: &DynamicImage) -> cutout::Result<DynamicImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
    }
}

/// Capability stub that produces a fully transparent result
pub struct TransparentRemover;

impl BackgroundRemover for TransparentRemover {
    fn remove_background(&self, image: &DynamicImage) -> cutout::Result<DynamicImage> {
        let cleared = RgbaImage::from_pixel(image.width(), image.height(), Rgba([0, 0, 0, 0]));
        Ok(DynamicImage::ImageRgba8(cleared))
    }
}

/// Capability stub that fails on the nth invocation (1-based)
pub struct FailOnNth {
    pub fail_on: usize,
    pub calls: AtomicUsize,
}

impl FailOnNth {
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

impl BackgroundRemover for FailOnNth {
    fn remove_background(&self, image: &DynamicImage) -> cutout::Result<DynamicImage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(CutoutError::processing("model raised"));
        }
        Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
    }
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// Capability stub that runs a hook during the nth invocation (1-based)
///
/// The hook runs on the blocking worker, which is exactly where a user's
/// mid-run command (cancel, enqueue) lands relative to the driver: while an
/// item is in flight.
pub struct HookOnNth {
    pub hook_on: usize,
    pub calls: AtomicUsize,
    hook: Mutex<Option<Hook>>,
}

impl HookOnNth {
    pub fn new(hook_on: usize) -> Self {
        Self {
            hook_on,
            calls: AtomicUsize::new(0),
            hook: Mutex::new(None),
        }
    }

    pub fn set_hook(&self, hook: Hook) {
        *self.hook.lock().unwrap() = Some(hook);
    }
}

impl BackgroundRemover for HookOnNth {
    fn remove_background(&self, image: &DynamicImage) -> cutout::Result<DynamicImage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.hook_on {
            if let Some(hook) = self.hook.lock().unwrap().as_ref() {
                hook();
            }
        }
        Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
    }
}

/// Events captured by `RecordingReporter`, in callback order
#[derive(Debug, Clone)]
pub enum ReportedEvent {
    BatchStart(usize),
    ItemStart(PathBuf, usize),
    Progress(ProgressUpdate),
    ItemComplete(PathBuf, Option<PathBuf>),
    ItemError(PathBuf, String),
    BatchComplete { succeeded: usize, cancelled: bool },
}

/// Progress reporter that records every callback for assertions
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportedEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ReportedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn overall_percents(&self) -> Vec<f32> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                ReportedEvent::Progress(update) => Some(update.overall_percent),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReportedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_batch_start(&self, total: usize) {
        self.push(ReportedEvent::BatchStart(total));
    }

    fn on_item_start(&self, source: &Path, index: usize) {
        self.push(ReportedEvent::ItemStart(source.to_path_buf(), index));
    }

    fn on_progress(&self, update: ProgressUpdate) {
        self.push(ReportedEvent::Progress(update));
    }

    fn on_item_complete(&self, source: &Path, saved_to: Option<&Path>) {
        self.push(ReportedEvent::ItemComplete(
            source.to_path_buf(),
            saved_to.map(Path::to_path_buf),
        ));
    }

    fn on_item_error(&self, source: &Path, error: &str) {
        self.push(ReportedEvent::ItemError(
            source.to_path_buf(),
            error.to_string(),
        ));
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        self.push(ReportedEvent::BatchComplete {
            succeeded: summary.succeeded,
            cancelled: summary.cancelled,
        });
    }
}
