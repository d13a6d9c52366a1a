//! Synchronous GPU buffer readback.
//!
//! Copies a storage buffer into a `MAP_READ` staging buffer, submits, and
//! blocks on the device until that submission and the map complete. Meant
//! for tests and debugging, never the per-frame path.

use std::sync::mpsc;

use crate::error::{DeformError, DeformResult};
use crate::render::GpuContext;

/// Read `count` packed `[f32; 3]` elements from the start of `src`.
pub fn read_vec3s(gpu: &GpuContext, src: &wgpu::Buffer, count: usize) -> DeformResult<Vec<[f32; 3]>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let byte_size = (count * std::mem::size_of::<[f32; 3]>()) as u64;

    let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback staging buffer"),
        size: byte_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback encoder"),
        });
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, byte_size);
    let submission = gpu.queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = mpsc::channel();
    staging
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

    gpu.device
        .poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        })
        .map_err(|e| DeformError::Readback(e.to_string()))?;
    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(DeformError::Readback(e.to_string())),
        Err(_) => return Err(DeformError::Readback("map callback dropped".into())),
    }

    let out = {
        let data = staging.slice(..).get_mapped_range();
        bytemuck::cast_slice::<u8, [f32; 3]>(&data).to_vec()
    };
    staging.unmap();
    Ok(out)
}
