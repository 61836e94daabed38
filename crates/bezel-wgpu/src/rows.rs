//! Row padding arithmetic shared by both strategies.
//!
//! `copy_texture_to_buffer` requires `bytes_per_row` to be a multiple of
//! `COPY_BYTES_PER_ROW_ALIGNMENT` (256), so staging buffers carry padded
//! rows that are compacted away when draining into the tightly packed
//! transfer buffer.

use bezel_shared::{SurfaceExtent, BYTES_PER_PIXEL};

pub(crate) fn unpadded_bytes_per_row(extent: SurfaceExtent) -> u32 {
    extent.width * BYTES_PER_PIXEL as u32
}

pub(crate) fn padded_bytes_per_row(unpadded_bytes_per_row: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded_bytes_per_row.div_ceil(align) * align
}

pub(crate) fn staging_buffer_len(extent: SurfaceExtent) -> u64 {
    padded_bytes_per_row(unpadded_bytes_per_row(extent)) as u64 * extent.height as u64
}

/// Copy the mapped staging contents into `dst`, dropping the row padding.
pub(crate) fn compact_padded_rows(mapped: &[u8], extent: SurfaceExtent, dst: &mut [u8]) {
    let unpadded_bpr = unpadded_bytes_per_row(extent) as usize;
    let padded_bpr = padded_bytes_per_row(unpadded_bpr as u32) as usize;

    debug_assert_eq!(dst.len(), extent.byte_len());
    debug_assert!(mapped.len() >= padded_bpr * extent.height as usize);

    for row in 0..extent.height as usize {
        let src_off = row * padded_bpr;
        let dst_off = row * unpadded_bpr;
        dst[dst_off..dst_off + unpadded_bpr]
            .copy_from_slice(&mapped[src_off..src_off + unpadded_bpr]);
    }
}
