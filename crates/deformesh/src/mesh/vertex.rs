//! # Vertex Streams: What the Renderer Binds
//!
//! Unlike an interleaved `MeshVertex`, a deformable mesh keeps each attribute
//! in its own buffer. The compute passes rewrite positions and normals every
//! touch while UVs never change, so splitting them lets the kernels work on
//! tightly packed `f32` arrays without touching data they don't own.
//!
//! ```text
//! slot 0  positions  (buffer A)   Float32x3  stride 12  location(0)
//! slot 1  normals                 Float32x3  stride 12  location(1)
//! slot 2  uvs                     Float32x2  stride  8  location(2)
//! index   u32, triangle list
//! ```
//!
//! Buffer A is the only position stream a renderer ever sees. Buffer B is
//! scratch space for the displacement pass and is never bound for drawing.

/// Position stream layout (buffer A).
pub const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

/// Normal stream layout.
pub const NORMAL_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

/// Texture coordinate stream layout.
pub const UV_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x2,
    }],
};

/// Index format of the triangle list.
pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;

/// Primitive topology of the index list.
pub const TOPOLOGY: wgpu::PrimitiveTopology = wgpu::PrimitiveTopology::TriangleList;

/// All three vertex stream layouts, in slot order.
pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    [POSITION_LAYOUT, NORMAL_LAYOUT, UV_LAYOUT]
}
