use crate::pacer::FramePacer;

/// Ceiling applied while the output is not being displayed, instead of
/// running unthrottled for nobody.
pub const HIDDEN_RATE_CEILING: u32 = 20;

/// What one render tick drives. Implemented by the hosting application; the
/// driver owns only ordering and pacing.
pub trait LoopHost {
    /// Consume a pending context-restart request (one-shot).
    fn take_restart_request(&mut self) -> bool;

    /// Tear down and recreate the GPU context.
    fn restart_context(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Whether the GPU context is initialized. A tick on an uninitialized
    /// context is a programming error, not a recoverable state.
    fn is_created(&self) -> bool;

    /// Advance application/simulation state. Hosts drain their render-thread
    /// task queue at the top of this call.
    fn update(&mut self);

    /// Whether the output is currently visible/consumed.
    fn is_renderable(&self) -> bool;

    /// Present the frame buffer (swap).
    fn present(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Post-frame hook: resource reclamation and the frame-transfer tick.
    fn post_frame(&mut self);

    /// The configured frame-rate ceiling; `None` means match the display
    /// settings (no explicit pacing).
    fn rate_ceiling(&self) -> Option<u32>;

    /// Service the windowing system's event queue.
    fn pump_events(&mut self);

    /// Sink for transient per-tick errors. Nothing is retried through this.
    fn handle_error(&mut self, context: &str, error: &(dyn std::error::Error + 'static));
}

/// Sequences one render tick and keeps the pacer in sync with the host's
/// rate settings.
pub struct RenderLoopDriver {
    pacer: FramePacer,
    applied_ceiling: Option<Option<u32>>,
}

impl RenderLoopDriver {
    pub fn new() -> Self {
        Self {
            pacer: FramePacer::new(),
            applied_ceiling: None,
        }
    }

    /// The tick interval currently enforced, if any.
    pub fn interval_ns(&self) -> Option<u64> {
        self.pacer.interval_ns()
    }

    /// Execute one iteration of the render loop on the render thread.
    pub fn run_tick(&mut self, host: &mut dyn LoopHost) {
        // A restart is a recovery attempt; failure leaves the previous
        // (possibly degraded) state in place rather than tearing down the
        // loop.
        if host.take_restart_request() {
            match host.restart_context() {
                Ok(()) => tracing::debug!("render context restarted"),
                Err(err) => tracing::warn!("failed to restart the render context: {err}"),
            }
        }

        assert!(host.is_created(), "render context is not initialized");

        host.update();

        let renderable = host.is_renderable();
        if renderable {
            if let Err(err) = host.present() {
                // Swap failures are transient; the next tick presents again.
                host.handle_error("error while presenting the frame", err.as_ref());
            }
        }

        host.post_frame();

        let desired = if renderable {
            host.rate_ceiling()
        } else {
            Some(HIDDEN_RATE_CEILING)
        };
        if self.applied_ceiling != Some(desired) {
            self.applied_ceiling = Some(desired);
            self.pacer.set_rate_ceiling(desired);
        }

        self.pacer.pace();
        host.pump_events();
    }
}

impl Default for RenderLoopDriver {
    fn default() -> Self {
        Self::new()
    }
}
