//! wgpu plumbing shared by the mesh and the deformer.

pub mod gpu;
pub mod readback;

pub use gpu::GpuContext;
