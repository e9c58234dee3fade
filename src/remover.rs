//! The background-removal capability seam
//!
//! The model that actually removes backgrounds is an opaque external
//! capability. This crate holds only the trait; frontends inject a concrete
//! implementation (an ONNX session, a subprocess wrapper, a remote call).

use crate::error::Result;
use image::DynamicImage;

/// An opaque, synchronous background-removal capability
///
/// Implementations may take seconds per image and must not assume they run
/// on the caller's thread: the engine dispatches calls onto a blocking
/// worker. The call is all-or-nothing; there is no partial-progress or abort
/// hook, which is why batch cancellation only takes effect between items.
pub trait BackgroundRemover: Send + Sync {
    /// Produce a copy of `image` with its background removed
    ///
    /// The result is expected to carry an alpha channel where removed
    /// regions are transparent.
    ///
    /// # Errors
    /// Returns `Processing` when the underlying capability raises.
    fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage>;

    /// Whether the underlying capability library is present and usable
    ///
    /// Frontends use this to drive an install-or-abort flow before any batch
    /// work starts; `BatchController::start` fails with `DependencyMissing`
    /// when this returns false.
    fn is_available(&self) -> bool {
        true
    }

    /// Human-readable name of the capability, for diagnostics
    fn name(&self) -> &str {
        "background-remover"
    }
}
