use bezel_transfer::TransferMode;

/// Default vertical field of view for the reshaped frustum, in degrees.
pub const DEFAULT_CAMERA_FOV_DEGREES: f32 = 45.0;

/// Environment variable overriding [`DEFAULT_CAMERA_FOV_DEGREES`].
pub const CAMERA_FOV_ENV: &str = "BEZEL_CAMERA_FOV";

/// Configuration of one frame-transfer processor.
///
/// Plain data passed at construction; the render thread mutates it only
/// from its own tick (via the processor's setters), never the UI thread.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub transfer_mode: TransferMode,
    /// Frame-rate ceiling in Hz; `None` means match the display settings.
    pub frame_rate_ceiling: Option<u32>,
    /// Field of view applied when the frustum is recomputed on resize.
    pub camera_fov_degrees: f32,
    /// Whether this processor owns context-level input binding and size
    /// propagation ("main" output).
    pub primary: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transfer_mode: TransferMode::default(),
            frame_rate_ceiling: None,
            camera_fov_degrees: camera_fov_from_env(),
            primary: true,
        }
    }
}

/// The FOV override, read from [`CAMERA_FOV_ENV`] with the 45° default.
pub fn camera_fov_from_env() -> f32 {
    std::env::var(CAMERA_FOV_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<f32>().ok())
        .unwrap_or(DEFAULT_CAMERA_FOV_DEGREES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_primary_unbuffered_unthrottled() {
        let config = BridgeConfig::default();
        assert_eq!(config.transfer_mode, TransferMode::Unbuffered);
        assert_eq!(config.frame_rate_ceiling, None);
        assert!(config.primary);
        assert_eq!(config.camera_fov_degrees, DEFAULT_CAMERA_FOV_DEGREES);
    }
}
