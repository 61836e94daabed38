//! wgpu-backed readback strategies.
//!
//! Two implementations of `bezel_transfer::ReadbackStrategy` move the
//! render-target contents into the shared CPU buffer:
//! - [`ImmediateReadback`] maps the staging buffer synchronously (the render
//!   thread eats the GPU→CPU latency every tick)
//! - [`DoubleBufferedReadback`] ping-pongs two staging buffers so the drain
//!   always targets a transfer issued one tick earlier
//!
//! The render target must be a 4-byte-per-pixel format (the transfer
//! contract is byte-BGRA, i.e. `Bgra8Unorm`) created with `COPY_SRC` usage.

mod context;
mod double_buffered;
mod immediate;
mod rows;

pub use context::{ContextError, RenderContext};
pub use double_buffered::DoubleBufferedReadback;
pub use immediate::ImmediateReadback;
