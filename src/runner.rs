//! Async job runner for single background-removal units of work
//!
//! Wraps one synchronous capability call on a blocking worker so the control
//! context stays responsive, and reports the outcome through a single event
//! channel per item. Exactly one of `Complete` or `Failed` is sent per
//! spawned job; a panic inside the capability is caught and routed to
//! `Failed` rather than crashing the process.

use crate::{
    error::{CutoutError, Result},
    remover::BackgroundRemover,
};
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Notification emitted by an in-flight removal job
#[derive(Debug)]
pub enum JobEvent {
    /// Completion fraction 0-100 for the in-flight item
    ///
    /// The capability is monolithic, so the runner itself emits `100` once,
    /// immediately before `Complete`; intermediate milestones shown to users
    /// are synthesized by the batch controller.
    Progress(u8),
    /// The capability produced a result
    Complete(DynamicImage),
    /// The capability raised or its worker panicked
    Failed(CutoutError),
}

/// Handle to one spawned removal job
///
/// The controller is the sole subscriber: it drains `events` until the
/// terminal `Complete`/`Failed` arrives, then the worker is fully resolved.
pub struct JobHandle {
    events: mpsc::Receiver<JobEvent>,
}

impl JobHandle {
    /// Receive the next event, or `None` once the job has fully resolved
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }
}

/// Start a non-blocking removal of `image` using `remover`
///
/// The image is moved into the worker by value; the worker touches no
/// controller state and returns its result through the event channel, so no
/// shared mutable state crosses the thread boundary.
///
/// Must be called within a tokio runtime.
#[must_use]
pub fn spawn_removal(remover: Arc<dyn BackgroundRemover>, image: DynamicImage) -> JobHandle {
    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        let worker =
            tokio::task::spawn_blocking(move || remover.remove_background(&image)).await;

        let event = match worker {
            Ok(Ok(result)) => {
                // The capability only signals all-or-nothing completion.
                let _ = tx.send(JobEvent::Progress(100)).await;
                JobEvent::Complete(result)
            },
            Ok(Err(e)) => JobEvent::Failed(e),
            Err(join_err) => {
                debug!(error = %join_err, "removal worker did not finish cleanly");
                let reason = if join_err.is_panic() {
                    "background-removal worker panicked"
                } else {
                    "background-removal worker was aborted"
                };
                JobEvent::Failed(CutoutError::processing(reason))
            },
        };

        // Receiver dropped means the controller gave up on this item; the
        // event is discarded, matching the cancelled-callback semantics.
        let _ = tx.send(event).await;
    });

    JobHandle { events: rx }
}

/// Convenience wrapper: run one removal to completion and return the result
///
/// # Errors
/// Returns the job's `Failed` error, including caught worker panics.
pub async fn remove_background_async(
    remover: Arc<dyn BackgroundRemover>,
    image: DynamicImage,
) -> Result<DynamicImage> {
    let mut handle = spawn_removal(remover, image);
    while let Some(event) = handle.next_event().await {
        match event {
            JobEvent::Progress(_) => {},
            JobEvent::Complete(result) => return Ok(result),
            JobEvent::Failed(e) => return Err(e),
        }
    }
    Err(CutoutError::processing(
        "removal job ended without a completion event",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PassthroughRemover;

    impl BackgroundRemover for PassthroughRemover {
        fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage> {
            Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
        }
    }

    struct FailingRemover;

    impl BackgroundRemover for FailingRemover {
        fn remove_background(&self, _image: &DynamicImage) -> Result<DynamicImage> {
            Err(CutoutError::processing("model raised"))
        }
    }

    struct PanickingRemover;

    impl BackgroundRemover for PanickingRemover {
        fn remove_background(&self, _image: &DynamicImage) -> Result<DynamicImage> {
            panic!("model blew up");
        }
    }

    #[tokio::test]
    async fn test_complete_emits_progress_then_result() {
        let mut handle = spawn_removal(
            Arc::new(PassthroughRemover),
            DynamicImage::new_rgb8(2, 2),
        );

        let first = handle.next_event().await.unwrap();
        assert!(matches!(first, JobEvent::Progress(100)));

        let second = handle.next_event().await.unwrap();
        match second {
            JobEvent::Complete(image) => assert_eq!(image.width(), 2),
            other => panic!("expected Complete, got {:?}", other),
        }

        assert!(handle.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_capability_error_routes_to_failed() {
        let result =
            remove_background_async(Arc::new(FailingRemover), DynamicImage::new_rgb8(1, 1)).await;
        assert!(matches!(result, Err(CutoutError::Processing(_))));
    }

    #[tokio::test]
    async fn test_worker_panic_is_caught() {
        let result =
            remove_background_async(Arc::new(PanickingRemover), DynamicImage::new_rgb8(1, 1))
                .await;
        match result {
            Err(CutoutError::Processing(msg)) => assert!(msg.contains("panicked")),
            other => panic!("expected Processing error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exactly_one_terminal_event() {
        let mut handle =
            spawn_removal(Arc::new(FailingRemover), DynamicImage::new_rgb8(1, 1));

        let mut terminals = 0;
        while let Some(event) = handle.next_event().await {
            if matches!(event, JobEvent::Complete(_) | JobEvent::Failed(_)) {
                terminals += 1;
            }
        }
        assert_eq!(terminals, 1);
    }
}
