#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("no suitable gpu adapter available")]
    NoAdapter,
    #[error("gpu device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// The device/queue pair the readback strategies operate on.
///
/// The hosting application normally owns its own wgpu context and hands the
/// handles in; `request_headless` exists for embedders without a surface and
/// for tests.
pub struct RenderContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl RenderContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Acquire a surfaceless device on the default adapter.
    pub async fn request_headless() -> Result<Self, ContextError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(ContextError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("bezel readback device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await?;

        Ok(Self { device, queue })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
