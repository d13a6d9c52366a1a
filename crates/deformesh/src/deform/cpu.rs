//! CPU reference deformer.
//!
//! Runs the same two passes as [`GpuDeformer`](super::GpuDeformer) over plain
//! `Vec`s, walking groups and lanes in the order a GPU would launch them.
//! Always available; used for correctness checks and hosts without a GPU.

use super::dispatch::{
    DispatchPlan, MAX_GROUPS_PER_DIMENSION, MAX_NORMAL_GROUP_SIZE, displacement_plan, normal_plan,
    warn_if_minimal_groups,
};
use super::kernel::{displace_vertex, lane_normal};
use super::params::DeformParams;
use super::request::DeformRequest;
use super::MeshDeformer;
use crate::config::DeformerConfig;
use crate::error::DeformResult;
use crate::math::Vec3;
use crate::mesh::PlaneGeometry;

/// A deformable mesh held in host memory.
///
/// `current` plays buffer A and `scratch` buffer B.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuMesh {
    current: Vec<[f32; 3]>,
    scratch: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    vertex_count: u32,
}

impl CpuMesh {
    /// Copy geometry into host buffers.
    ///
    /// Fails with [`DeformError::InvalidConfig`](crate::error::DeformError::InvalidConfig)
    /// when the geometry arrays disagree in length or split a triangle.
    pub fn new(geometry: &PlaneGeometry) -> DeformResult<Self> {
        let vertex_count = geometry.validate()?;
        warn_if_minimal_groups(vertex_count);
        Ok(Self {
            current: geometry.positions.clone(),
            scratch: geometry.positions.clone(),
            normals: geometry.normals.clone(),
            uvs: geometry.uvs.clone(),
            indices: geometry.indices.clone(),
            vertex_count,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count as usize
    }

    /// Settled positions (buffer A).
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.current
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// Sequential implementation of the displacement and normal passes.
pub struct CpuDeformer {
    config: DeformerConfig,
    #[cfg(feature = "diagnostics")]
    stats: crate::diag::DeformStats,
}

impl CpuDeformer {
    pub fn new(config: DeformerConfig) -> DeformResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            #[cfg(feature = "diagnostics")]
            stats: Default::default(),
        })
    }

    #[cfg(feature = "diagnostics")]
    pub fn stats(&self) -> &crate::diag::DeformStats {
        &self.stats
    }
}

impl MeshDeformer for CpuDeformer {
    type Mesh = CpuMesh;

    fn name(&self) -> &str {
        "cpu"
    }

    fn build_mesh(&self, geometry: &PlaneGeometry) -> DeformResult<CpuMesh> {
        CpuMesh::new(geometry)
    }

    fn deform(&mut self, mesh: &mut CpuMesh, request: &DeformRequest) -> DeformResult<()> {
        let vertex_count = mesh.vertex_count;
        let displacement = displacement_plan(vertex_count, self.config.execution_width, MAX_GROUPS_PER_DIMENSION);
        let normals = normal_plan(vertex_count, MAX_GROUPS_PER_DIMENSION);
        if displacement.is_empty() || request.is_noop() {
            log::trace!("cpu deform skipped on {vertex_count} vertices");
            #[cfg(feature = "diagnostics")]
            self.stats.record_skipped();
            return Ok(());
        }
        let params = DeformParams::from(request);

        // Stage 1: A -> B, one lane per vertex.
        for group in launched_groups(&displacement) {
            for lane in 0..displacement.group_size as usize {
                let index = group * displacement.group_size as usize + lane;
                if index >= mesh.current.len() {
                    continue;
                }
                let moved = displace_vertex(Vec3::from(mesh.current[index]), &params);
                mesh.scratch[index] = moved.to_array();
            }
        }

        // Stage 2: B -> normals + A, whole triangles per group.
        let size = normals.group_size as usize;
        let mut corners = [Vec3::ZERO; MAX_NORMAL_GROUP_SIZE as usize];
        for group in launched_groups(&normals) {
            let base = group * size;
            if base >= mesh.current.len() {
                continue;
            }
            for lane in 0..size {
                corners[lane] = Vec3::from(mesh.scratch[base + lane]);
            }
            for lane in 0..size {
                mesh.normals[base + lane] = lane_normal(&corners[..size], lane).to_array();
                mesh.current[base + lane] = corners[lane].to_array();
            }
        }

        log::debug!(
            "cpu deform: {vertex_count} vertices, displacement {:?}, normals {:?}",
            displacement,
            normals
        );
        #[cfg(feature = "diagnostics")]
        self.stats.record(vertex_count, displacement, normals);
        Ok(())
    }
}

/// Linear group indices in launch order, rebuilt from the folded grid the
/// same way the kernels do: `y * groups_per_row + x`.
fn launched_groups(plan: &DispatchPlan) -> impl Iterator<Item = usize> {
    let [per_row, rows] = plan.grid.map(|n| n as usize);
    (0..rows).flat_map(move |y| (0..per_row).map(move |x| y * per_row + x))
}
