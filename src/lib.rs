//! bezel: lock-free frame transfer between a real-time renderer and a
//! retained-mode UI toolkit.
//!
//! A render thread produces frames into a GPU render target; a UI thread
//! paints them from a CPU-visible BGRA buffer. The two never block on each
//! other: buffer ownership is handed off through atomic state words, resize
//! requests settle through a counter-debounced signal, and the only
//! cross-thread calls are one-shot scheduled closures.
//!
//! The workspace crates, leaf first:
//! - [`shared`]: the atomic handoff and resize protocols
//! - [`transfer`]: the transfer channel and its host seams
//! - [`gpu`]: wgpu-backed readback strategies
//! - [`render_loop`]: frame pacing and the tick driver
//! - [`bridge`]: the per-output processor and integration helpers

pub use bezel_bridge as bridge;
pub use bezel_loop as render_loop;
pub use bezel_shared as shared;
pub use bezel_transfer as transfer;
pub use bezel_wgpu as gpu;
