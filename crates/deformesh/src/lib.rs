//! # Deformesh: Touch-Driven Mesh Deformation
//!
//! Builds a grid-tessellated plane and pushes its vertices around a touch
//! point with two wgpu compute passes: a per-vertex displacement pass and a
//! per-triangle normal pass that keeps lighting correct on the bent surface.
//!
//! Start with `use deformesh::prelude::*`, build a [`DeformableMesh`](mesh::DeformableMesh)
//! and feed [`DeformRequest`](deform::DeformRequest)s to a
//! [`GpuDeformer`](deform::GpuDeformer), or drive both through a
//! [`DeformSession`](session::DeformSession).

pub mod config;
pub mod deform;
pub mod error;
pub mod math;
pub mod mesh;
pub mod prelude;
pub mod render;
pub mod session;

#[cfg(feature = "diagnostics")]
pub mod diag;
