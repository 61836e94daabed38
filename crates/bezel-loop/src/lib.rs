//! The render thread's tick cadence.
//!
//! [`FramePacer`] enforces a frame-rate ceiling with a tiered
//! sleep/yield/busy-poll wait, and [`RenderLoopDriver`] sequences one render
//! tick: context restart, state advance, presentation, post-frame hook,
//! ceiling refresh, pacing, event pump.

mod driver;
mod pacer;

pub use driver::{LoopHost, RenderLoopDriver, HIDDEN_RATE_CEILING};
pub use pacer::{interval_ns_from_fps, FramePacer};
