#![allow(clippy::uninlined_format_args)]

//! # Cutout
//!
//! The headless core of a batch background-removal application. The GUI
//! shell (windows, dialogs, drag-and-drop chrome) and the removal model are
//! both external collaborators: the model is injected behind the
//! [`BackgroundRemover`] trait, the GUI observes runs through the
//! [`ProgressReporter`] trait and answers directory requests through the
//! [`OutputDirectoryProvider`] trait.
//!
//! ## Features
//!
//! - **Processing Queue**: validated FIFO queue with duplicate rejection
//!   and source-size guardrails
//! - **Sequential Batch Driver**: one worker at a time, per-item failures
//!   never abort a run
//! - **Blended Progress**: per-item progress mapped into a smooth overall
//!   batch percentage
//! - **Cooperative Cancellation**: effective at the next item boundary, the
//!   in-flight item is never aborted
//! - **Auto-Save**: collision-safe `{name}_processed.png` naming during
//!   batch runs, plus pattern-based batch export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cutout::{BackgroundRemover, BatchController, EngineConfig, FixedOutputDirectory};
//! use std::sync::Arc;
//!
//! # async fn example(remover: Arc<dyn BackgroundRemover>) -> cutout::Result<()> {
//! let controller = BatchController::new(remover, EngineConfig::default())?
//!     .with_output_directory_provider(Arc::new(FixedOutputDirectory("out".into())));
//!
//! controller.enqueue("photos/cat.jpg")?;
//! controller.enqueue("photos/dog.png")?;
//!
//! if let Some(summary) = controller.start().await? {
//!     println!("processed {}/{} images", summary.succeeded, summary.total);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod remover;
pub mod runner;
pub mod services;
pub mod types;

// Public API exports
pub use config::{EngineConfig, EngineConfigBuilder, OutputFormat, SourceGuardrails};
pub use controller::{
    BatchController, BatchState, ControllerState, FixedOutputDirectory, NoOutputDirectory,
    OutputDirectoryProvider,
};
pub use error::{CutoutError, Result};
pub use remover::BackgroundRemover;
pub use runner::{remove_background_async, spawn_removal, JobEvent, JobHandle};
pub use services::{
    blend_overall, ConsoleProgressReporter, ImageIoService, NoOpProgressReporter,
    OutputFormatHandler, ProgressReporter, ProgressUpdate,
};
pub use types::{BatchSaveReport, BatchSummary, ProcessedImage, QueueEntry};

use std::sync::Arc;

/// Remove the background from an image provided as bytes
///
/// One-shot convenience for frontends that have a single in-memory image
/// (clipboard paste, drag-and-drop payload) and no queue to manage. The
/// capability call still runs on a blocking worker.
///
/// # Errors
/// * `InvalidImage` - the bytes are not a decodable image
/// * `Processing` - the capability raised
pub async fn remove_background_from_bytes(
    image_bytes: &[u8],
    remover: Arc<dyn BackgroundRemover>,
) -> Result<image::DynamicImage> {
    let image = ImageIoService::load_from_bytes(image_bytes)?;
    remove_background_async(remover, image).await
}

/// Remove the background from an image file
///
/// # Errors
/// * `Io` / `InvalidImage` - the file cannot be read or decoded
/// * `Processing` - the capability raised
pub async fn remove_background_from_path<P: AsRef<std::path::Path>>(
    path: P,
    remover: Arc<dyn BackgroundRemover>,
) -> Result<image::DynamicImage> {
    let image = ImageIoService::load_image(path)?;
    remove_background_async(remover, image).await
}
