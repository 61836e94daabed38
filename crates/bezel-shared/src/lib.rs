//! Lock-free state shared between the render thread and the UI thread.
//!
//! Everything here is plain atomics: the frame path must never take a lock,
//! so buffer ownership and resize negotiation are expressed as small
//! compare-and-swap protocols instead. The `loom` feature swaps in Loom's
//! model-checked atomics for tests.

mod extent;
mod resize_signal;
mod transfer_state;

pub use extent::{SurfaceExtent, BYTES_PER_PIXEL};
pub use resize_signal::{ResizeRequest, ResizeSignal, RESIZE_SETTLE_TICKS};
pub use transfer_state::{EnterOutcome, ExitError, TransferState};
