//! The CPU-side frame transfer channel.
//!
//! This crate is GPU-agnostic: it owns the shared pixel buffer, gates the
//! render-side copy and the UI-side publish through the two
//! [`bezel_shared::TransferState`] words, and schedules the publish closure
//! onto the UI thread. The actual GPU→CPU pixel movement is behind the
//! [`ReadbackStrategy`] capability trait (see `bezel-wgpu` for the real
//! implementations).

mod channel;
mod error;
mod host;
mod pixel;
mod strategy;

pub use channel::TransferChannel;
pub use error::ReadbackError;
pub use host::{ErrorSink, ImageSink, UiScheduler, UiTask};
pub use strategy::{CopyOutcome, ReadbackStrategy, TransferMode};
