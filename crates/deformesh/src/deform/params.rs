//! Uniform blocks shared with the WGSL kernels.
//!
//! ```text
//! DeformParams (48 bytes, WGSL uniform layout)
//! ┌──────────────────────┬─────────┬──────────────────────┬───────────────┐
//! │ location  vec3<f32>  │ _pad0   │ direction vec3<f32>  │ radius_squared│
//! │ offset 0             │ 12      │ 16                   │ 28            │
//! ├───────────┬──────────┴─────────┴──────────────────────┴───────────────┤
//! │ amplitude │ _pad1 [f32; 3]                                             │
//! │ 32        │ 36 → 48                                                    │
//! └───────────┴────────────────────────────────────────────────────────────┘
//! ```
//!
//! `vec3<f32>` aligns to 16 bytes in uniform space, so `radius_squared`
//! slots into the tail of `direction` and the struct rounds up to 48. The
//! padding fields carry nothing and are always zero.

use bytemuck::{Pod, Zeroable};

use super::request::DeformRequest;

/// Packed deformation request as read by `displace.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DeformParams {
    pub location: [f32; 3],   // 12 bytes
    pub _pad0: f32,           // 4 bytes → 16
    pub direction: [f32; 3],  // 12 bytes
    pub radius_squared: f32,  // 4 bytes → 32
    pub amplitude: f32,       // 4 bytes
    pub _pad1: [f32; 3],      // 12 bytes → 48
}

impl From<&DeformRequest> for DeformParams {
    fn from(request: &DeformRequest) -> Self {
        Self {
            location: request.location.to_array(),
            direction: request.direction.normalize_or_zero().to_array(),
            radius_squared: request.radius_squared,
            amplitude: request.amplitude,
            ..Self::zeroed()
        }
    }
}

/// Per-pass dispatch bounds: how many vertices exist and how the group grid
/// was folded into two dimensions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct DispatchParams {
    pub vertex_count: u32,
    pub groups_per_row: u32,
    pub _pad: [u32; 2], // → 16
}

impl DispatchParams {
    pub fn new(vertex_count: u32, groups_per_row: u32) -> Self {
        Self {
            vertex_count,
            groups_per_row,
            _pad: [0; 2],
        }
    }
}
