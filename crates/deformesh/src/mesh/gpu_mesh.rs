//! # Deformable Mesh: GPU Buffer Storage
//!
//! Uploading a [`PlaneGeometry`] produces a [`DeformableMesh`]: five GPU
//! buffers sized exactly to the vertex count.
//!
//! | Buffer  | Contents                  | Usage                               |
//! |---------|---------------------------|-------------------------------------|
//! | A       | settled positions         | STORAGE, VERTEX, COPY_SRC, COPY_DST |
//! | B       | displaced scratch         | STORAGE, COPY_SRC                   |
//! | normals | per-vertex face normals   | STORAGE, VERTEX, COPY_SRC           |
//! | uvs     | texture coordinates       | VERTEX                              |
//! | indices | `0..vertex_count`         | INDEX                               |
//!
//! There is no resize path. Changing the plane means building a new mesh
//! and dropping the old one along with its buffers.
//!
//! Upload refuses geometry whose position buffer would not fit in a single
//! storage binding on the device, so an oversized plane fails here as a
//! configuration error instead of inside the first compute dispatch.

use wgpu::util::DeviceExt;

use super::plane::PlaneGeometry;
use crate::deform::dispatch::warn_if_minimal_groups;
use crate::deform::gpu::DeformBindings;
use crate::error::{DeformError, DeformResult};
use crate::render::{GpuContext, readback};

/// A plane whose positions and normals live in GPU storage buffers.
pub struct DeformableMesh {
    pub(crate) current: wgpu::Buffer,
    pub(crate) scratch: wgpu::Buffer,
    pub(crate) normals: wgpu::Buffer,
    uvs: wgpu::Buffer,
    indices: wgpu::Buffer,
    vertex_count: u32,
    /// Compute bind groups, built by the deformer that last ran on this mesh.
    pub(crate) bindings: Option<DeformBindings>,
}

/// Bytes per packed `vec3<f32>` element in the position and normal buffers.
const VEC3_BYTES: u64 = 12;

/// Check that `vertex_count` packed positions fit one storage binding.
pub fn check_buffer_limits(vertex_count: u32, limits: &wgpu::Limits) -> DeformResult<()> {
    let bytes = u64::from(vertex_count) * VEC3_BYTES;
    let max = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    if bytes > max {
        return Err(DeformError::config(format!(
            "{vertex_count} vertices need {bytes} bytes per position buffer; the device allows {max} ({} vertices)",
            max / VEC3_BYTES
        )));
    }
    Ok(())
}

impl DeformableMesh {
    /// Upload geometry into freshly allocated buffers.
    ///
    /// Fails with [`DeformError::InvalidConfig`] when the geometry arrays are
    /// inconsistent or the mesh exceeds the device's buffer limits.
    pub fn upload(gpu: &GpuContext, geometry: &PlaneGeometry) -> DeformResult<Self> {
        let vertex_count = geometry.validate()?;
        check_buffer_limits(vertex_count, &gpu.limits())?;

        let positions: &[u8] = bytemuck::cast_slice(&geometry.positions);

        let current = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("deform positions A (current)"),
            contents: positions,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
        });
        let scratch = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("deform positions B (scratch)"),
            contents: positions,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });
        let normals = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("deform normals"),
            contents: bytemuck::cast_slice(&geometry.normals),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_SRC,
        });
        let uvs = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("deform uvs"),
            contents: bytemuck::cast_slice(&geometry.uvs),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("deform indices"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        warn_if_minimal_groups(vertex_count);
        log::info!("Uploaded deformable mesh: {vertex_count} vertices");

        Ok(Self {
            current,
            scratch,
            normals,
            uvs,
            indices,
            vertex_count,
            bindings: None,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices to pass to `draw_indexed`.
    pub fn index_count(&self) -> u32 {
        self.vertex_count
    }

    /// Vertex buffers in slot order (positions, normals, uvs), matching
    /// [`vertex_layouts`](super::vertex::vertex_layouts). Bind once; the
    /// buffers never change identity.
    pub fn vertex_buffers(&self) -> [&wgpu::Buffer; 3] {
        [&self.current, &self.normals, &self.uvs]
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.indices
    }

    /// Block until the settled positions (buffer A) are copied back.
    pub fn read_positions(&self, gpu: &GpuContext) -> DeformResult<Vec<[f32; 3]>> {
        readback::read_vec3s(gpu, &self.current, self.vertex_count as usize)
    }

    /// Block until the normals are copied back.
    pub fn read_normals(&self, gpu: &GpuContext) -> DeformResult<Vec<[f32; 3]>> {
        readback::read_vec3s(gpu, &self.normals, self.vertex_count as usize)
    }
}
