//! Common imports: `use deformesh::prelude::*;`

pub use crate::config::{BrushConfig, DeformerConfig, PlaneConfig, Settings};
pub use crate::deform::{CpuDeformer, DeformRequest, GpuDeformer, MeshDeformer, PendingDeform};
pub use crate::error::{DeformError, DeformResult};
pub use crate::math::{Quat, Transform, Vec3};
pub use crate::mesh::{DeformableMesh, PlaneGeometry, build_plane, vertex_layouts};
pub use crate::render::GpuContext;
pub use crate::session::DeformSession;

#[cfg(feature = "diagnostics")]
pub use crate::diag::DeformStats;
