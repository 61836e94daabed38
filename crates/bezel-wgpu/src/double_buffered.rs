use std::sync::mpsc;
use std::sync::Arc;

use bezel_shared::SurfaceExtent;
use bezel_transfer::{CopyOutcome, ReadbackError, ReadbackStrategy};

use crate::context::RenderContext;
use crate::immediate::encode_target_copy;
use crate::rows;

/// One of the two alternating GPU transfer handles.
struct TransferSlot {
    buffer: wgpu::Buffer,
    /// Completion channel of the map issued for this slot, if a transfer is
    /// in flight. A slot is never re-issued while this is set: the drain
    /// consumes it first, which also unmaps the buffer.
    pending: Option<mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>>,
}

/// PBO-style double-buffered readback.
///
/// Each tick the cursor flips: a new asynchronous copy+map is issued into
/// the current slot while the other slot, whose transfer has had one full
/// tick to complete, is drained into the destination. The published frame
/// is therefore one tick stale, and the render thread never waits on a
/// same-tick transfer.
pub struct DoubleBufferedReadback {
    context: Arc<RenderContext>,
    target: Arc<wgpu::Texture>,
    extent: SurfaceExtent,
    slots: [TransferSlot; 2],
    cursor: usize,
}

impl DoubleBufferedReadback {
    pub fn new(context: Arc<RenderContext>, target: Arc<wgpu::Texture>, extent: SurfaceExtent) -> Self {
        let extent = extent.clamped();
        let make_slot = |index: usize| TransferSlot {
            buffer: context.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some(if index == 0 {
                    "bezel double-buffered staging 0"
                } else {
                    "bezel double-buffered staging 1"
                }),
                size: rows::staging_buffer_len(extent),
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }),
            pending: None,
        };
        let slots = [make_slot(0), make_slot(1)];
        Self {
            context,
            target,
            extent,
            slots,
            cursor: 0,
        }
    }

    /// Issue the asynchronous copy+map for `index`.
    fn issue(&mut self, index: usize) {
        let device = self.context.device();
        let queue = self.context.queue();
        let slot = &mut self.slots[index];
        debug_assert!(slot.pending.is_none(), "slot re-issued before drain");

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("bezel double-buffered readback encoder"),
        });
        encode_target_copy(&mut encoder, &self.target, &slot.buffer, self.extent);
        queue.submit(Some(encoder.finish()));

        let (sender, receiver) = mpsc::channel();
        slot.buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        // Kick the device without blocking; completions are collected when
        // the slot is drained a tick later.
        device.poll(wgpu::Maintain::Poll);
        slot.pending = Some(receiver);
    }

    /// Drain the previously issued transfer for `index` into `dst`.
    fn drain(&mut self, index: usize, dst: &mut [u8]) -> Result<CopyOutcome, ReadbackError> {
        let Some(receiver) = self.slots[index].pending.take() else {
            // First tick: nothing was issued into this slot yet.
            return Ok(CopyOutcome::Warming);
        };

        let device = self.context.device();
        device.poll(wgpu::Maintain::Poll);

        let map_result = match receiver.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => {
                // The transfer did not finish within its tick of headroom.
                // Correctness beats latency here; block it out.
                tracing::warn!("double-buffered readback had to block on an unfinished transfer");
                device.poll(wgpu::Maintain::Wait);
                receiver.recv().map_err(|_| {
                    ReadbackError::Device("map completion channel closed".to_string())
                })?
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                return Err(ReadbackError::Device(
                    "map completion channel closed".to_string(),
                ));
            }
        };
        map_result.map_err(|err| ReadbackError::MapFailed(err.to_string()))?;

        let slot = &self.slots[index];
        let slice = slot.buffer.slice(..);
        let mapped = slice.get_mapped_range();
        rows::compact_padded_rows(&mapped, self.extent, dst);
        drop(mapped);
        slot.buffer.unmap();

        Ok(CopyOutcome::Published)
    }
}

impl ReadbackStrategy for DoubleBufferedReadback {
    fn copy_into(&mut self, dst: &mut [u8]) -> Result<CopyOutcome, ReadbackError> {
        if dst.len() != self.extent.byte_len() {
            return Err(ReadbackError::BufferLength {
                expected: self.extent.byte_len(),
                actual: dst.len(),
            });
        }

        // Strict alternation: issue into the current slot, drain the other.
        self.cursor = (self.cursor + 1) % 2;
        let drain_index = (self.cursor + 1) % 2;

        self.issue(self.cursor);
        self.drain(drain_index, dst)
    }

    fn dispose(&mut self) {
        for slot in &mut self.slots {
            // An in-flight map on a destroyed buffer resolves as an error in
            // a callback nobody listens to; that is the intended teardown.
            slot.pending = None;
            slot.buffer.destroy();
        }
    }
}
