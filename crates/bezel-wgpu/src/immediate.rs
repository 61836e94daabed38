use std::sync::mpsc;
use std::sync::Arc;

use bezel_shared::SurfaceExtent;
use bezel_transfer::{CopyOutcome, ReadbackError, ReadbackStrategy};

use crate::context::RenderContext;
use crate::rows;

/// Synchronous readback: copy the render target into a staging buffer and
/// block until the map completes.
///
/// Always publishes the frame rendered this tick, at the cost of a pipeline
/// bubble while the GPU→CPU transfer drains.
pub struct ImmediateReadback {
    context: Arc<RenderContext>,
    target: Arc<wgpu::Texture>,
    extent: SurfaceExtent,
    staging: wgpu::Buffer,
}

impl ImmediateReadback {
    pub fn new(context: Arc<RenderContext>, target: Arc<wgpu::Texture>, extent: SurfaceExtent) -> Self {
        let extent = extent.clamped();
        let staging = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("bezel immediate readback staging"),
            size: rows::staging_buffer_len(extent),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            context,
            target,
            extent,
            staging,
        }
    }
}

impl ReadbackStrategy for ImmediateReadback {
    fn copy_into(&mut self, dst: &mut [u8]) -> Result<CopyOutcome, ReadbackError> {
        if dst.len() != self.extent.byte_len() {
            return Err(ReadbackError::BufferLength {
                expected: self.extent.byte_len(),
                actual: dst.len(),
            });
        }

        let device = self.context.device();
        let queue = self.context.queue();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("bezel immediate readback encoder"),
        });
        encode_target_copy(&mut encoder, &self.target, &self.staging, self.extent);
        queue.submit(Some(encoder.finish()));

        let slice = self.staging.slice(..);
        map_blocking(device, &slice)?;

        let mapped = slice.get_mapped_range();
        rows::compact_padded_rows(&mapped, self.extent, dst);
        drop(mapped);
        self.staging.unmap();

        Ok(CopyOutcome::Published)
    }

    fn dispose(&mut self) {
        self.staging.destroy();
    }
}

/// Record a render-target → staging copy with padded rows.
pub(crate) fn encode_target_copy(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::Texture,
    staging: &wgpu::Buffer,
    extent: SurfaceExtent,
) {
    let padded_bpr = rows::padded_bytes_per_row(rows::unpadded_bytes_per_row(extent));
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(extent.height),
            },
        },
        wgpu::Extent3d {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        },
    );
}

/// Map a staging slice for reading and block until the GPU signals it.
pub(crate) fn map_blocking(
    device: &wgpu::Device,
    slice: &wgpu::BufferSlice<'_>,
) -> Result<(), ReadbackError> {
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    match receiver.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(ReadbackError::MapFailed(err.to_string())),
        Err(_) => Err(ReadbackError::Device(
            "map completion channel closed".to_string(),
        )),
    }
}
