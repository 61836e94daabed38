//! Convenience wiring for the common single-view embedding.

use crate::config::BridgeConfig;
use crate::processor::{FrameProcessor, ProcessorBinding};

/// Normalize a configuration for offscreen embedding.
///
/// There is no display to vsync against, so an unset ceiling is pinned to
/// 60 Hz instead of letting the render loop run unthrottled; 0 is treated
/// as unset.
pub fn prepare_settings(config: &mut BridgeConfig) {
    match config.frame_rate_ceiling {
        None | Some(0) => config.frame_rate_ceiling = Some(60),
        Some(_) => {}
    }
}

/// Build the primary processor, bind it, and hand it back ready to tick.
pub fn bind_main(mut config: BridgeConfig, binding: ProcessorBinding) -> FrameProcessor {
    prepare_settings(&mut config);
    config.primary = true;

    let mut processor = FrameProcessor::new(config);
    processor.bind(binding);
    processor
}
