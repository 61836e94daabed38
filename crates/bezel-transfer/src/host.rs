//! Seams to the hosting application and UI toolkit.
//!
//! The toolkit's threading primitive is assumed, not reimplemented: the only
//! thing the transfer path needs is "run this closure on the UI thread".

use bezel_shared::SurfaceExtent;

/// A one-shot task scheduled across threads.
pub type UiTask = Box<dyn FnOnce() + Send>;

/// Schedules one-shot closures onto the UI toolkit's event loop.
///
/// Implementations wrap the toolkit's own primitive (e.g. `Platform.runLater`
/// style dispatch). Ordering between tasks scheduled from the same thread
/// must be preserved; no other guarantee is required.
pub trait UiScheduler: Send + Sync {
    fn run_on_ui(&self, task: UiTask);
}

/// The UI-side image resource the transfer channel publishes into.
///
/// `publish` is invoked on the UI thread while the image-side transfer state
/// is RUNNING, so the pixel slice is stable for the duration of the call.
/// The pixels are byte-order BGRA without premultiplied alpha, tightly
/// packed at `extent.byte_len()` bytes.
pub trait ImageSink: Send + Sync {
    fn publish(&self, pixels: &[u8], extent: SurfaceExtent);
}

/// Receives transient device errors that are isolated per tick.
///
/// Nothing is retried through this interface; the render loop's next tick is
/// the retry.
pub trait ErrorSink: Send + Sync {
    fn transient(&self, context: &str, error: &(dyn std::error::Error + 'static));
}
