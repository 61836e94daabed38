use std::sync::Arc;

use bezel_shared::{ResizeRequest, ResizeSignal, SurfaceExtent};
use bezel_transfer::{ErrorSink, ReadbackError, TransferChannel, TransferMode, UiScheduler};

use crate::config::BridgeConfig;
use crate::stage::{HostContext, OutputStage};

/// Builds the transfer channel for a given extent and mode. Invoked on the
/// render thread whenever a settled resize is applied.
pub type ChannelFactory =
    Box<dyn FnMut(SurfaceExtent, TransferMode) -> Result<TransferChannel, ReadbackError> + Send>;

/// Cloneable handle the UI layer's size/ratio listeners call into.
#[derive(Clone)]
pub struct ResizeHandle(Arc<ResizeSignal>);

impl ResizeHandle {
    /// Record a component resize from the UI side. The extent is clamped to
    /// 1x1; repeated identical notifications are absorbed.
    pub fn notify_component_resized(&self, width: u32, height: u32, preserve_aspect: bool) {
        if self
            .0
            .request(ResizeRequest::new(width, height, preserve_aspect))
        {
            tracing::debug!(
                "notify resized to {}x{}",
                width.max(1),
                height.max(1)
            );
        }
    }
}

/// Everything a processor needs from its surroundings, handed over at bind
/// time.
pub struct ProcessorBinding {
    /// The output stage this processor transfers frames from.
    pub stage: Box<dyn OutputStage>,
    /// Context-level hooks (size propagation, input binding).
    pub host: Arc<dyn HostContext>,
    /// The UI toolkit's scheduling primitive.
    pub ui: Arc<dyn UiScheduler>,
    /// Sink for transient per-tick errors.
    pub errors: Arc<dyn ErrorSink>,
    /// Channel builder invoked on every applied resize.
    pub channels: ChannelFactory,
    /// Runs once on the UI thread after binding; wire the widget's
    /// width/height/ratio listeners to the provided handle here.
    pub attach_ui: Option<Box<dyn FnOnce(ResizeHandle) + Send>>,
    /// Runs once on the UI thread after unbinding; detach listeners here.
    pub detach_ui: Option<Box<dyn FnOnce() + Send>>,
}

struct Bound {
    stage: Box<dyn OutputStage>,
    host: Arc<dyn HostContext>,
    ui: Arc<dyn UiScheduler>,
    errors: Arc<dyn ErrorSink>,
    channels: ChannelFactory,
    detach_ui: Option<Box<dyn FnOnce() + Send>>,
}

/// The per-output frame transfer orchestrator.
///
/// Lifecycle: unbound → bound(enabled) → unbound, with `cleanup` disposing
/// the live channel. The render thread drives `post_frame` once per tick;
/// the UI thread only ever touches the resize handle and the scheduled
/// attach/detach closures.
pub struct FrameProcessor {
    config: BridgeConfig,
    resize: Arc<ResizeSignal>,
    enabled: bool,
    binding: Option<Bound>,
    channel: Option<TransferChannel>,
}

impl FrameProcessor {
    /// A fresh processor starts with its resize signal armed at 1x1, so the
    /// first bound ticks build the initial channel without waiting for a UI
    /// notification.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            resize: Arc::new(ResizeSignal::new()),
            enabled: false,
            binding: None,
            channel: None,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_primary(&self) -> bool {
        self.config.primary
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Whether the initial channel has been built.
    pub fn is_initialized(&self) -> bool {
        self.channel.is_some()
    }

    /// Extent of the live channel, if one has been built.
    pub fn output_extent(&self) -> Option<SurfaceExtent> {
        self.channel.as_ref().map(|channel| channel.extent())
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.config.transfer_mode
    }

    /// Render-thread setter; takes effect when the channel is next rebuilt.
    pub fn set_transfer_mode(&mut self, mode: TransferMode) {
        self.config.transfer_mode = mode;
    }

    pub fn resize_handle(&self) -> ResizeHandle {
        ResizeHandle(Arc::clone(&self.resize))
    }

    /// See [`ResizeHandle::notify_component_resized`].
    pub fn notify_component_resized(&self, width: u32, height: u32, preserve_aspect: bool) {
        self.resize_handle()
            .notify_component_resized(width, height, preserve_aspect);
    }

    /// Re-apply the currently stored extent on the next ticks.
    pub fn reshape(&self) {
        self.resize.rearm();
    }

    /// Bind the processor to an output stage.
    ///
    /// Double-binding is a programming error and panics. Input forwarding
    /// (primary only) and the embedder's listener attachment run as a
    /// scheduled UI-thread task.
    pub fn bind(&mut self, mut binding: ProcessorBinding) {
        assert!(
            self.binding.is_none(),
            "frame processor is already bound"
        );

        self.enabled = true;

        let host = Arc::clone(&binding.host);
        let primary = self.config.primary;
        let handle = self.resize_handle();
        let attach = binding.attach_ui.take();
        binding.ui.run_on_ui(Box::new(move || {
            if primary {
                host.bind_input();
            }
            if let Some(attach) = attach {
                attach(handle);
            }
        }));

        self.binding = Some(Bound {
            stage: binding.stage,
            host: binding.host,
            ui: binding.ui,
            errors: binding.errors,
            channels: binding.channels,
            detach_ui: binding.detach_ui,
        });
    }

    /// Detach from the output stage. Safe to call from any thread and on an
    /// unbound processor; the UI-side detachment runs as a scheduled task.
    pub fn unbind(&mut self) {
        let Some(mut bound) = self.binding.take() else {
            return;
        };
        self.enabled = false;

        let host = Arc::clone(&bound.host);
        let primary = self.config.primary;
        let detach = bound.detach_ui.take();
        bound.ui.run_on_ui(Box::new(move || {
            if primary {
                host.unbind_input();
            }
            if let Some(detach) = detach {
                detach();
            }
        }));
    }

    /// One render tick: copy the finished frame, then apply a settled resize
    /// if one is pending.
    pub fn post_frame(&mut self) {
        if !self.enabled || self.binding.is_none() {
            return;
        }

        if let Some(channel) = self.channel.as_mut() {
            if let Err(err) = channel.copy_frame() {
                let bound = self.binding.as_ref().expect("checked above");
                tracing::warn!("frame readback failed: {err}");
                bound
                    .errors
                    .transient("error while reading back the frame", &err);
            }
        }

        if let Some(request) = self.resize.take_tick() {
            self.apply_resize(request);
        }
    }

    /// Dispose the live channel. Called on processor teardown; the processor
    /// can keep running afterwards only via a fresh resize application.
    pub fn cleanup(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.dispose();
        }
    }

    fn apply_resize(&mut self, request: ResizeRequest) {
        let extent = request.extent();
        tracing::debug!(
            "reshape on the render thread to {}x{}",
            extent.width,
            extent.height
        );

        let primary = self.config.primary;
        let fov = self.config.camera_fov_degrees;
        let mode = self.config.transfer_mode;
        let bound = self.binding.as_mut().expect("resize applied while unbound");

        if primary {
            bound.stage.notify_reshape(extent);
        } else {
            bound
                .stage
                .resize_viewpoint(extent, request.preserve_aspect);
        }
        bound.stage.set_frustum_perspective(fov, extent.aspect());
        bound.stage.prepare_output_target(extent);
        bound.stage.refresh_dependents(extent);

        // Build the replacement before the old channel goes away, so a
        // failure never leaves the processor without a channel.
        match (bound.channels)(extent, mode) {
            Ok(new_channel) => {
                if let Some(mut old) = self.channel.replace(new_channel) {
                    old.dispose();
                }
                if primary {
                    bound.host.propagate_size(extent);
                }
            }
            Err(err) => {
                tracing::warn!("failed to rebuild the transfer channel: {err}");
                bound
                    .errors
                    .transient("error while rebuilding the transfer channel", &err);
                self.resize.rearm();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use bezel_transfer::{CopyOutcome, ImageSink, ReadbackStrategy, UiTask};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum StageCall {
        NotifyReshape(u32, u32),
        ResizeViewpoint(u32, u32, bool),
        Frustum,
        PrepareTarget(u32, u32),
        RefreshDependents,
    }

    #[derive(Clone, Default)]
    struct RecordingStage(Arc<Mutex<Vec<StageCall>>>);

    impl RecordingStage {
        fn calls(&self) -> Vec<StageCall> {
            self.0.lock().unwrap().clone()
        }
    }

    impl OutputStage for RecordingStage {
        fn notify_reshape(&mut self, extent: SurfaceExtent) {
            self.0
                .lock()
                .unwrap()
                .push(StageCall::NotifyReshape(extent.width, extent.height));
        }

        fn resize_viewpoint(&mut self, extent: SurfaceExtent, fix_aspect: bool) {
            self.0.lock().unwrap().push(StageCall::ResizeViewpoint(
                extent.width,
                extent.height,
                fix_aspect,
            ));
        }

        fn set_frustum_perspective(&mut self, _fov_degrees: f32, _aspect: f32) {
            self.0.lock().unwrap().push(StageCall::Frustum);
        }

        fn prepare_output_target(&mut self, extent: SurfaceExtent) {
            self.0
                .lock()
                .unwrap()
                .push(StageCall::PrepareTarget(extent.width, extent.height));
        }

        fn refresh_dependents(&mut self, _extent: SurfaceExtent) {
            self.0.lock().unwrap().push(StageCall::RefreshDependents);
        }
    }

    #[derive(Default)]
    struct FakeHost {
        size: Mutex<Option<SurfaceExtent>>,
        input_bound: AtomicBool,
    }

    impl HostContext for FakeHost {
        fn propagate_size(&self, extent: SurfaceExtent) {
            *self.size.lock().unwrap() = Some(extent);
        }

        fn bind_input(&self) {
            self.input_bound.store(true, Ordering::SeqCst);
        }

        fn unbind_input(&self) {
            self.input_bound.store(false, Ordering::SeqCst);
        }
    }

    /// Runs scheduled UI tasks immediately on the calling thread.
    struct InlineScheduler;

    impl UiScheduler for InlineScheduler {
        fn run_on_ui(&self, task: UiTask) {
            task();
        }
    }

    #[derive(Default)]
    struct RecordingErrors(Mutex<Vec<String>>);

    impl ErrorSink for RecordingErrors {
        fn transient(&self, context: &str, error: &(dyn std::error::Error + 'static)) {
            self.0.lock().unwrap().push(format!("{context}: {error}"));
        }
    }

    struct NullSink;

    impl ImageSink for NullSink {
        fn publish(&self, _pixels: &[u8], _extent: SurfaceExtent) {}
    }

    struct FillStrategy;

    impl ReadbackStrategy for FillStrategy {
        fn copy_into(&mut self, dst: &mut [u8]) -> Result<CopyOutcome, ReadbackError> {
            dst.fill(0x7F);
            Ok(CopyOutcome::Published)
        }

        fn dispose(&mut self) {}
    }

    struct FailingStrategy;

    impl ReadbackStrategy for FailingStrategy {
        fn copy_into(&mut self, _dst: &mut [u8]) -> Result<CopyOutcome, ReadbackError> {
            Err(ReadbackError::Device("device lost".to_string()))
        }

        fn dispose(&mut self) {}
    }

    struct Fixture {
        stage: RecordingStage,
        host: Arc<FakeHost>,
        errors: Arc<RecordingErrors>,
        builds: Arc<AtomicUsize>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                stage: RecordingStage::default(),
                host: Arc::new(FakeHost::default()),
                errors: Arc::new(RecordingErrors::default()),
                builds: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn binding_with_factory(&self, channels: ChannelFactory) -> ProcessorBinding {
            ProcessorBinding {
                stage: Box::new(self.stage.clone()),
                host: self.host.clone(),
                ui: Arc::new(InlineScheduler),
                errors: self.errors.clone(),
                channels,
                attach_ui: None,
                detach_ui: None,
            }
        }

        fn binding(&self) -> ProcessorBinding {
            let builds = self.builds.clone();
            self.binding_with_factory(Box::new(move |extent, mode| {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(TransferChannel::new(
                    Box::new(FillStrategy),
                    mode,
                    extent,
                    Arc::new(InlineScheduler),
                    Arc::new(NullSink),
                ))
            }))
        }

        fn builds(&self) -> usize {
            self.builds.load(Ordering::SeqCst)
        }

        fn errors(&self) -> Vec<String> {
            self.errors.0.lock().unwrap().clone()
        }
    }

    fn settled(fixture: &Fixture) -> FrameProcessor {
        let mut processor = FrameProcessor::new(BridgeConfig::default());
        processor.bind(fixture.binding());
        for _ in 0..3 {
            processor.post_frame();
        }
        processor
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn double_bind_is_a_programming_error() {
        let fixture = Fixture::new();
        let mut processor = FrameProcessor::new(BridgeConfig::default());
        processor.bind(fixture.binding());
        processor.bind(fixture.binding());
    }

    #[test]
    fn initial_ticks_build_the_channel_and_settle() {
        let fixture = Fixture::new();
        let mut processor = FrameProcessor::new(BridgeConfig::default());
        assert!(!processor.is_initialized());

        processor.bind(fixture.binding());
        assert!(processor.is_enabled());
        assert!(fixture.host.input_bound.load(Ordering::SeqCst));

        for _ in 0..4 {
            processor.post_frame();
        }

        // The initial 1x1 arming is applied on two consecutive ticks, then
        // the processor goes quiet.
        assert_eq!(fixture.builds(), 2);
        assert_eq!(processor.output_extent(), Some(SurfaceExtent::new(1, 1)));
        assert_eq!(*fixture.host.size.lock().unwrap(), Some(SurfaceExtent::new(1, 1)));
    }

    #[test]
    fn resize_burst_settles_on_the_final_extent() {
        let fixture = Fixture::new();
        let mut processor = settled(&fixture);
        let builds_after_settle = fixture.builds();

        processor.notify_component_resized(300, 300, false);
        processor.notify_component_resized(640, 480, false);

        for _ in 0..4 {
            processor.post_frame();
        }

        assert_eq!(fixture.builds(), builds_after_settle + 2);
        assert_eq!(processor.output_extent(), Some(SurfaceExtent::new(640, 480)));
        assert!(fixture
            .stage
            .calls()
            .contains(&StageCall::NotifyReshape(640, 480)));

        // Stable until the next notification arrives.
        processor.post_frame();
        assert_eq!(fixture.builds(), builds_after_settle + 2);
    }

    #[test]
    fn degenerate_resize_applies_as_unit_extent() {
        let fixture = Fixture::new();
        let mut processor = settled(&fixture);

        processor.notify_component_resized(640, 480, false);
        for _ in 0..3 {
            processor.post_frame();
        }
        assert_eq!(processor.output_extent(), Some(SurfaceExtent::new(640, 480)));

        processor.notify_component_resized(0, 0, false);
        for _ in 0..3 {
            processor.post_frame();
        }
        assert_eq!(processor.output_extent(), Some(SurfaceExtent::new(1, 1)));
    }

    #[test]
    fn secondary_output_resizes_its_viewpoint_directly() {
        let fixture = Fixture::new();
        let mut processor = FrameProcessor::new(BridgeConfig {
            primary: false,
            ..BridgeConfig::default()
        });
        processor.bind(fixture.binding());
        processor.post_frame();

        let calls = fixture.stage.calls();
        assert!(calls.contains(&StageCall::ResizeViewpoint(1, 1, false)));
        assert!(!calls
            .iter()
            .any(|call| matches!(call, StageCall::NotifyReshape(_, _))));
        // Secondary outputs do not own context-level size propagation or
        // input binding.
        assert_eq!(*fixture.host.size.lock().unwrap(), None);
        assert!(!fixture.host.input_bound.load(Ordering::SeqCst));
    }

    #[test]
    fn reshape_sequence_precedes_channel_replacement() {
        let fixture = Fixture::new();
        let mut processor = FrameProcessor::new(BridgeConfig::default());
        processor.bind(fixture.binding());
        processor.post_frame();

        assert_eq!(
            fixture.stage.calls(),
            vec![
                StageCall::NotifyReshape(1, 1),
                StageCall::Frustum,
                StageCall::PrepareTarget(1, 1),
                StageCall::RefreshDependents,
            ]
        );
    }

    #[test]
    fn disabled_processor_skips_the_tick() {
        let fixture = Fixture::new();
        let mut processor = FrameProcessor::new(BridgeConfig::default());
        processor.bind(fixture.binding());
        processor.set_enabled(false);

        for _ in 0..3 {
            processor.post_frame();
        }
        assert_eq!(fixture.builds(), 0);
        assert!(!processor.is_initialized());

        processor.set_enabled(true);
        processor.post_frame();
        assert_eq!(fixture.builds(), 1);
    }

    #[test]
    fn readback_failure_reaches_the_error_sink_and_tick_survives() {
        let fixture = Fixture::new();
        let builds = fixture.builds.clone();
        let binding = fixture.binding_with_factory(Box::new(move |extent, mode| {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(TransferChannel::new(
                Box::new(FailingStrategy),
                mode,
                extent,
                Arc::new(InlineScheduler),
                Arc::new(NullSink),
            ))
        }));

        let mut processor = FrameProcessor::new(BridgeConfig::default());
        processor.bind(binding);
        for _ in 0..3 {
            processor.post_frame();
        }

        let errors = fixture.errors();
        assert!(!errors.is_empty());
        assert!(errors[0].contains("reading back"));
        // The processor is still live and ticking.
        assert!(processor.is_initialized());
    }

    #[test]
    fn factory_failure_keeps_the_old_channel_and_retries() {
        let fixture = Fixture::new();
        let builds = fixture.builds.clone();
        let binding = fixture.binding_with_factory(Box::new(move |extent, mode| {
            let call = builds.fetch_add(1, Ordering::SeqCst);
            // The settled initial extent builds fine (calls 0 and 1); the
            // first rebuild attempt at the new extent fails once.
            if call == 2 {
                return Err(ReadbackError::Device("out of memory".to_string()));
            }
            Ok(TransferChannel::new(
                Box::new(FillStrategy),
                mode,
                extent,
                Arc::new(InlineScheduler),
                Arc::new(NullSink),
            ))
        }));

        let mut processor = FrameProcessor::new(BridgeConfig::default());
        processor.bind(binding);
        for _ in 0..3 {
            processor.post_frame();
        }
        assert_eq!(processor.output_extent(), Some(SurfaceExtent::new(1, 1)));

        processor.notify_component_resized(800, 600, false);
        processor.post_frame();
        // The rebuild failed; the old channel is still in place and the
        // request was re-armed.
        assert_eq!(processor.output_extent(), Some(SurfaceExtent::new(1, 1)));
        assert!(!fixture.errors().is_empty());

        processor.post_frame();
        assert_eq!(processor.output_extent(), Some(SurfaceExtent::new(800, 600)));
    }

    #[test]
    fn unbind_detaches_input_and_allows_rebinding() {
        let fixture = Fixture::new();
        let mut processor = settled(&fixture);
        assert!(fixture.host.input_bound.load(Ordering::SeqCst));

        processor.unbind();
        assert!(!processor.is_bound());
        assert!(!processor.is_enabled());
        assert!(!fixture.host.input_bound.load(Ordering::SeqCst));

        // Unbind is idempotent.
        processor.unbind();

        // Both the same instance and a fresh one can bind again.
        processor.bind(fixture.binding());
        assert!(processor.is_bound());

        let mut fresh = FrameProcessor::new(BridgeConfig::default());
        fresh.bind(fixture.binding());
        assert!(fresh.is_bound());
    }

    #[test]
    fn cleanup_disposes_the_channel() {
        let fixture = Fixture::new();
        let mut processor = settled(&fixture);
        assert!(processor.is_initialized());

        processor.cleanup();
        assert!(!processor.is_initialized());
        assert_eq!(processor.output_extent(), None);
    }
}
