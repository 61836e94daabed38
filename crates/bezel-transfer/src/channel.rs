use std::sync::Arc;

use bezel_shared::{SurfaceExtent, TransferState};

use crate::error::ReadbackError;
use crate::host::{ImageSink, UiScheduler};
use crate::pixel::PixelStore;
use crate::strategy::{CopyOutcome, ReadbackStrategy, TransferMode};

/// State shared with the UI-thread publish closures.
struct ChannelShared {
    extent: SurfaceExtent,
    frame_state: TransferState,
    image_state: TransferState,
    pixels: PixelStore,
}

/// Moves one frame per tick from the GPU into the UI-visible image.
///
/// The channel owns the shared pixel buffer and the readback strategy, and
/// is itself owned by the render thread. Exactly one instance is live per
/// processor; a resize builds a replacement at the new extent and disposes
/// this one.
pub struct TransferChannel {
    shared: Arc<ChannelShared>,
    strategy: Box<dyn ReadbackStrategy>,
    scheduler: Arc<dyn UiScheduler>,
    sink: Arc<dyn ImageSink>,
    mode: TransferMode,
    disposed: bool,
}

impl TransferChannel {
    pub fn new(
        strategy: Box<dyn ReadbackStrategy>,
        mode: TransferMode,
        extent: SurfaceExtent,
        scheduler: Arc<dyn UiScheduler>,
        sink: Arc<dyn ImageSink>,
    ) -> Self {
        let extent = extent.clamped();
        Self {
            shared: Arc::new(ChannelShared {
                extent,
                frame_state: TransferState::new(),
                image_state: TransferState::new(),
                pixels: PixelStore::new(extent.byte_len()),
            }),
            strategy,
            scheduler,
            sink,
            mode,
            disposed: false,
        }
    }

    pub fn extent(&self) -> SurfaceExtent {
        self.shared.extent
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Copy the just-rendered frame into the shared buffer and, on success,
    /// schedule the UI-thread publish.
    ///
    /// Render thread only. A concurrent `dispose` cannot race the copy: the
    /// copy either wins the frame side and completes before teardown starts,
    /// or observes the disposal and returns [`CopyOutcome::Cancelled`].
    /// Errors are not retried here; the next tick tries again naturally.
    pub fn copy_frame(&mut self) -> Result<CopyOutcome, ReadbackError> {
        if !self.shared.frame_state.enter_running() {
            return Ok(CopyOutcome::Cancelled);
        }

        debug_assert_eq!(self.shared.pixels.len(), self.shared.extent.byte_len());
        // Safety: the frame side is RUNNING, so this thread has exclusive
        // access to the buffer until `exit_running`.
        let result = self.strategy.copy_into(unsafe { self.shared.pixels.slice_mut() });

        if let Err(breach) = self.shared.frame_state.exit_running() {
            debug_assert!(false, "frame-side handoff corrupted: {breach}");
            tracing::error!("frame-side handoff corrupted: {breach}");
        }

        if matches!(result, Ok(CopyOutcome::Published)) {
            self.schedule_publish();
        }
        result
    }

    fn schedule_publish(&self) {
        let shared = Arc::clone(&self.shared);
        let sink = Arc::clone(&self.sink);
        self.scheduler.run_on_ui(Box::new(move || {
            if !shared.image_state.enter_running() {
                // Disposed while the task was queued; drop the frame.
                return;
            }
            // Safety: the image side is RUNNING, so the buffer is stable for
            // the duration of the publish.
            sink.publish(unsafe { shared.pixels.slice() }, shared.extent);
            if let Err(breach) = shared.image_state.exit_running() {
                debug_assert!(false, "image-side handoff corrupted: {breach}");
                tracing::error!("image-side handoff corrupted: {breach}");
            }
        }));
    }

    /// Tear down the channel: spin both sides out of any in-flight
    /// operation, release the strategy's GPU handles, and mark both sides
    /// terminally disposed.
    ///
    /// Idempotent from the caller's perspective; teardown itself runs exactly
    /// once. The spin is bounded because copy and publish are single-tick in
    /// duration.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let frame_live = self.shared.frame_state.begin_dispose();
        let image_live = self.shared.image_state.begin_dispose();

        self.strategy.dispose();

        if frame_live {
            self.shared.frame_state.finish_dispose();
        }
        if image_live {
            self.shared.image_state.finish_dispose();
        }
    }
}

impl Drop for TransferChannel {
    fn drop(&mut self) {
        self.dispose();
    }
}
