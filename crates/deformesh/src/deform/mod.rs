//! # Deform: Two-Pass Mesh Deformation
//!
//! A deformation runs as two compute passes over a double-buffered vertex
//! store:
//!
//! ```text
//!            ┌──────────────┐  displace (per vertex)   ┌──────────────┐
//!  request ─▶│  buffer A    │ ───────────────────────▶ │  buffer B    │
//!            │  (current)   │                          │  (scratch)   │
//!            └──────────────┘                          └──────┬───────┘
//!                   ▲          normals (per triangle)         │
//!                   └──────── copy back + face normals ◀──────┘
//! ```
//!
//! Pass 1 never writes A and pass 2 never reads A, so neither pass reads a
//! buffer it is writing. When pass 2 finishes, A holds the settled positions
//! again. The renderer binds A once and never rebinds: the "current" role
//! moves by copying data back, not by swapping buffer handles.
//!
//! Backends implement [`MeshDeformer`]: [`GpuDeformer`] on wgpu compute,
//! [`CpuDeformer`] as a sequential reference.

pub mod cpu;
pub mod dispatch;
pub mod gpu;
pub mod kernel;
pub mod params;
pub mod request;

pub use cpu::{CpuDeformer, CpuMesh};
pub use dispatch::{DispatchPlan, displacement_plan, normal_group_size, normal_plan};
pub use gpu::GpuDeformer;
pub use kernel::falloff;
pub use params::{DeformParams, DispatchParams};
pub use request::{DeformRequest, PendingDeform};

use crate::error::DeformResult;
use crate::mesh::PlaneGeometry;

/// A backend that can hold a deformable mesh and push its vertices around.
pub trait MeshDeformer {
    /// The backend's mesh storage.
    type Mesh;

    /// Short backend name for logs (e.g. "wgpu", "cpu").
    fn name(&self) -> &str;

    /// Allocate backend storage for freshly built geometry.
    fn build_mesh(&self, geometry: &PlaneGeometry) -> DeformResult<Self::Mesh>;

    /// Apply one request: displace, recompute normals, settle into buffer A.
    ///
    /// A mesh with no vertices is left untouched.
    fn deform(&mut self, mesh: &mut Self::Mesh, request: &DeformRequest) -> DeformResult<()>;
}
