//! # Dispatch Sizing
//!
//! Both compute passes run over the same flat vertex array but size their
//! thread groups very differently.
//!
//! ## Displacement: One Thread per Vertex
//!
//! Vertices are independent, so the group width is simply the configured
//! execution width and the group count is rounded up. The kernel ignores the
//! surplus lanes of the last group.
//!
//! ## Normals: Whole Triangles per Group
//!
//! The normal kernel stages its group's positions in workgroup memory and
//! each lane reads the other two corners of its triangle from there. A
//! triangle split across two groups would read a neighbour's slots, so:
//!
//! - the group size must be a multiple of 3, and
//! - the vertex count must divide evenly by it (no partial last group).
//!
//! The size is taken from a short table of multiples of 3, largest first.
//! Meshes always have `6 * cells` vertices, so 6 (and 3) always divide.
//! Counts sharing no larger factor with the table fall back to small
//! groups; that costs parallelism, never correctness.
//!
//! ## Large Meshes
//!
//! wgpu caps each dispatch dimension at 65535 groups. Plans fold larger
//! counts into a 2-D grid; the kernels linearise `workgroup_id` with
//! `groups_per_row` and discard groups past the end.

use serde::Serialize;

use super::params::DispatchParams;

/// Candidate normal-pass group sizes, tried in order.
pub const NORMAL_GROUP_CANDIDATES: [u32; 10] = [30, 27, 24, 21, 18, 15, 12, 9, 6, 3];

/// Largest normal-pass group size, which bounds the kernel's workgroup array.
pub const MAX_NORMAL_GROUP_SIZE: u32 = NORMAL_GROUP_CANDIDATES[0];

/// wgpu's default `max_compute_workgroups_per_dimension`.
pub const MAX_GROUPS_PER_DIMENSION: u32 = 65535;

/// How one compute pass is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    /// Threads per group.
    pub group_size: u32,
    /// Groups that carry real work.
    pub group_count: u32,
    /// Groups launched along x and y (`x * y >= group_count`).
    pub grid: [u32; 2],
}

impl DispatchPlan {
    fn folded(group_size: u32, group_count: u32, max_per_dimension: u32) -> Self {
        let max = max_per_dimension.max(1);
        let grid = if group_count <= max {
            [group_count, 1]
        } else {
            let rows = group_count.div_ceil(max);
            [group_count.div_ceil(rows), rows]
        };
        Self {
            group_size,
            group_count,
            grid,
        }
    }

    /// `true` when nothing needs to be dispatched.
    pub fn is_empty(&self) -> bool {
        self.group_count == 0
    }

    /// Uniform data the kernels need to recover a linear group index.
    pub fn params(&self, vertex_count: u32) -> DispatchParams {
        DispatchParams::new(vertex_count, self.grid[0])
    }

    /// Total threads launched, including guarded surplus lanes.
    pub fn invocations(&self) -> u64 {
        self.grid[0] as u64 * self.grid[1] as u64 * self.group_size as u64
    }
}

/// Plan the displacement pass: `ceil(vertex_count / width)` groups of `width`.
pub fn displacement_plan(vertex_count: u32, execution_width: u32, max_per_dimension: u32) -> DispatchPlan {
    let width = execution_width.max(1);
    DispatchPlan::folded(width, vertex_count.div_ceil(width), max_per_dimension)
}

/// Largest candidate that evenly divides `vertex_count`; 3 otherwise.
pub fn normal_group_size(vertex_count: u32) -> u32 {
    NORMAL_GROUP_CANDIDATES
        .iter()
        .copied()
        .find(|&size| vertex_count % size == 0)
        .unwrap_or(3)
}

/// Plan the normal pass: `vertex_count / group_size` whole-triangle groups.
pub fn normal_plan(vertex_count: u32, max_per_dimension: u32) -> DispatchPlan {
    debug_assert!(vertex_count % 3 == 0, "vertex count {vertex_count} is not whole triangles");
    let size = normal_group_size(vertex_count);
    DispatchPlan::folded(size, vertex_count / size, max_per_dimension)
}

/// Log when a mesh is stuck with minimal normal-pass parallelism.
pub(crate) fn warn_if_minimal_groups(vertex_count: u32) {
    if vertex_count > 0 && normal_group_size(vertex_count) == 3 {
        log::warn!(
            "{vertex_count} vertices only divide into normal groups of 3; the normal pass will run with minimal parallelism"
        );
    }
}
