//! Orchestration of the frame transfer: the scene processor that runs once
//! per render tick, the resize negotiation it drains, and the wiring seams
//! to the hosting application.
//!
//! The processor is bound to one output stage and copies the finished frame
//! through its [`bezel_transfer::TransferChannel`] each tick; when a resize
//! request has settled, it rebuilds the channel and the GPU output geometry
//! at the new extent.

mod config;
mod integrator;
mod processor;
mod stage;
mod task_queue;

pub use config::{camera_fov_from_env, BridgeConfig, CAMERA_FOV_ENV, DEFAULT_CAMERA_FOV_DEGREES};
pub use integrator::{bind_main, prepare_settings};
pub use processor::{ChannelFactory, FrameProcessor, ProcessorBinding, ResizeHandle};
pub use stage::{HostContext, OutputStage};
pub use task_queue::{RenderScheduler, RenderTaskQueue};
