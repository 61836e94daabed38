//! Seams to the scene/engine layer.
//!
//! The scene graph, cameras and render manager are external collaborators;
//! the processor only needs the handful of reshape operations below.

use bezel_shared::SurfaceExtent;

/// The output stage (viewport + render manager) a processor is bound to.
///
/// All methods are called from the render thread during resize application.
pub trait OutputStage: Send {
    /// Main output: propagate the reshape through the render manager, which
    /// resizes its own cameras.
    fn notify_reshape(&mut self, extent: SurfaceExtent);

    /// Secondary output: resize the source camera directly.
    fn resize_viewpoint(&mut self, extent: SurfaceExtent, fix_aspect: bool);

    /// Recompute the frustum for the (already resized) output.
    fn set_frustum_perspective(&mut self, fov_degrees: f32, aspect: f32);

    /// Recreate the offscreen output target at `extent`, unless a foreign
    /// processor owns the current one.
    fn prepare_output_target(&mut self, extent: SurfaceExtent);

    /// Initialize dependent processors that never ran, reshape the rest.
    fn refresh_dependents(&mut self, extent: SurfaceExtent);
}

/// Context-level hooks owned by the primary processor only.
pub trait HostContext: Send + Sync {
    /// Render thread: record the new output size on the hosting context.
    fn propagate_size(&self, extent: SurfaceExtent);

    /// UI thread: attach input forwarding to the destination widget.
    fn bind_input(&self);

    /// UI thread: detach input forwarding.
    fn unbind_input(&self);
}
