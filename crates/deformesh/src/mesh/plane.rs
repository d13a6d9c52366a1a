//! # Plane: The Tessellated Grid Generator
//!
//! The deformable surface is a flat grid on the XZ plane, sampled every
//! `step` units from `(0, 0, 0)` to `(width, 0, length)`. Each grid cell
//! becomes two triangles:
//!
//! ```text
//!  z ▲
//!    │ p1 ─────── p2        tri 0: p0, p1, p2
//!    │ │        ╱ │         tri 1: p0, p2, p3
//!    │ │     ╱    │
//!    │ │  ╱       │         normal: +Y (CCW seen from above)
//!    │ p0 ─────── p3
//!    └──────────────▶ x
//! ```
//!
//! ## No Shared Vertices
//!
//! All six corners of a cell are emitted as separate vertices, so the index
//! list is just `0..vertex_count`. That costs memory (six vertices per cell
//! instead of roughly one) but gives every triangle three private slots. The
//! normal pass relies on this: it writes one face normal into exactly three
//! consecutive slots with no other triangle competing for them, which is what
//! produces the faceted look and makes the pass race-free.
//!
//! ## Closing the Last Row
//!
//! Grid coordinates are computed as `i * step` and accepted while they are
//! `<=` the extent (with a small tolerance), rather than by accumulating
//! `x += step`. Accumulation drifts for steps like `0.1` and can drop the
//! final column; the integer form always closes the grid when `step` divides
//! the extent.
//!
//! ## UV Mapping
//!
//! Each vertex takes `(x / width, z / length)` from its own coordinates, so
//! coincident corners of neighbouring cells carry identical UVs.

use crate::config::PlaneConfig;
use crate::error::{DeformError, DeformResult};

/// Normal written into every vertex at build time.
pub const UP: [f32; 3] = [0.0, 1.0, 0.0];

/// Tolerance (in steps) when deciding whether the next grid line still lies
/// on the plane.
const GRID_EPSILON: f32 = 1e-4;

/// CPU-side geometry of a tessellated plane.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl PlaneGeometry {
    /// Number of vertices (equal to the index count).
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles in the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check the arrays describe whole, unshared triangles addressable with
    /// 32-bit indices, and return the vertex count.
    ///
    /// Every attribute array and the index list must have one entry per
    /// vertex, and the vertex count must be a multiple of 3.
    pub fn validate(&self) -> DeformResult<u32> {
        let count = self.positions.len();
        let lengths = [self.normals.len(), self.uvs.len(), self.indices.len()];
        if lengths.iter().any(|&len| len != count) {
            return Err(DeformError::config(format!(
                "geometry arrays disagree: {count} positions, {} normals, {} uvs, {} indices",
                lengths[0], lengths[1], lengths[2]
            )));
        }
        if count % 3 != 0 {
            return Err(DeformError::config(format!(
                "geometry has {count} vertices, not a whole number of triangles"
            )));
        }
        u32::try_from(count)
            .map_err(|_| DeformError::config(format!("geometry has {count} vertices; at most {} fit", u32::MAX)))
    }
}

/// Whole cells of `step` that fit along `extent`.
pub(crate) fn cell_count(extent: f32, step: f32) -> u64 {
    (extent / step + GRID_EPSILON).floor() as u64
}

/// Grid line coordinates `0, step, 2*step, ...` up to and including `extent`.
fn grid_lines(extent: f32, step: f32) -> Vec<f32> {
    (0..=cell_count(extent, step)).map(|i| i as f32 * step).collect()
}

/// Build a tessellated plane of `width` × `length` sampled every `step`.
///
/// Fails with [`DeformError::InvalidConfig`] for non-positive values, a step
/// larger than either extent, or a grid too large for 32-bit indices.
pub fn build_plane(config: &PlaneConfig) -> DeformResult<PlaneGeometry> {
    config.validate()?;
    let PlaneConfig { width, length, step } = *config;

    let xs = grid_lines(width, step);
    let zs = grid_lines(length, step);
    let cells = (xs.len() - 1) * (zs.len() - 1);

    let mut positions = Vec::with_capacity(cells * 6);
    let mut uvs = Vec::with_capacity(cells * 6);

    for pair_z in zs.windows(2) {
        let (z_prev, z) = (pair_z[0], pair_z[1]);
        for pair_x in xs.windows(2) {
            let (x_prev, x) = (pair_x[0], pair_x[1]);

            let p0 = [x_prev, 0.0, z_prev];
            let p1 = [x_prev, 0.0, z];
            let p2 = [x, 0.0, z];
            let p3 = [x, 0.0, z_prev];

            // Two triangles per cell (CCW from +Y)
            for p in [p0, p1, p2, p0, p2, p3] {
                positions.push(p);
                uvs.push([p[0] / width, p[2] / length]);
            }
        }
    }

    let vertex_count = positions.len();
    let normals = vec![UP; vertex_count];
    let last_index = u32::try_from(vertex_count)
        .map_err(|_| DeformError::config(format!("plane has {vertex_count} vertices; at most {} fit", u32::MAX)))?;
    let indices = (0..last_index).collect();

    log::info!(
        "Built plane {width} x {length} step {step}: {} x {} cells, {vertex_count} vertices",
        xs.len() - 1,
        zs.len() - 1
    );

    Ok(PlaneGeometry {
        positions,
        normals,
        uvs,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(width: f32, length: f32, step: f32) -> PlaneGeometry {
        build_plane(&PlaneConfig::new(width, length, step)).unwrap()
    }

    #[test]
    fn single_cell_has_six_vertices() {
        let g = plane(10.0, 10.0, 10.0);
        assert_eq!(g.vertex_count(), 6);
        assert_eq!(g.triangle_count(), 2);
        assert_eq!(
            g.positions,
            vec![
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 10.0],
                [10.0, 0.0, 10.0],
                [0.0, 0.0, 0.0],
                [10.0, 0.0, 10.0],
                [10.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn reference_plane_has_expected_count() {
        let g = build_plane(&PlaneConfig::default()).unwrap();
        assert_eq!(g.vertex_count(), 6 * 150 * 70);
    }

    #[test]
    fn vertex_count_matches_cell_formula() {
        for &(w, l, s) in &[(4.0, 3.0, 1.0), (2.0, 2.0, 0.5), (1.0, 1.0, 0.1), (7.0, 2.0, 2.0)] {
            let g = plane(w, l, s);
            let nx = (w / s + GRID_EPSILON).floor() as usize;
            let nz = (l / s + GRID_EPSILON).floor() as usize;
            assert_eq!(g.vertex_count(), 6 * nx * nz, "plane {w} x {l} step {s}");
            assert_eq!(g.vertex_count() % 6, 0);
        }
    }

    #[test]
    fn fractional_step_closes_last_row() {
        let g = plane(1.0, 1.0, 0.1);
        assert_eq!(g.vertex_count(), 6 * 10 * 10);
        let max_x = g.positions.iter().map(|p| p[0]).fold(0.0f32, f32::max);
        let max_z = g.positions.iter().map(|p| p[2]).fold(0.0f32, f32::max);
        assert!((max_x - 1.0).abs() < 1e-5);
        assert!((max_z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn partial_cell_at_boundary_is_dropped() {
        // 2.5 / 1.0 -> grid lines at 0, 1, 2; the half cell is not tessellated.
        let g = plane(2.5, 1.0, 1.0);
        assert_eq!(g.vertex_count(), 6 * 2);
    }

    #[test]
    fn indices_are_each_vertex_once_in_order() {
        let g = plane(5.0, 3.0, 1.0);
        assert_eq!(g.indices.len(), g.vertex_count());
        for (i, &idx) in g.indices.iter().enumerate() {
            assert_eq!(idx as usize, i);
        }
    }

    #[test]
    fn attribute_arrays_have_equal_length() {
        let g = plane(6.0, 4.0, 2.0);
        assert_eq!(g.normals.len(), g.vertex_count());
        assert_eq!(g.uvs.len(), g.vertex_count());
    }

    #[test]
    fn normals_point_up() {
        let g = plane(3.0, 3.0, 1.0);
        assert!(g.normals.iter().all(|&n| n == UP));
    }

    #[test]
    fn uvs_follow_own_coordinates() {
        let g = plane(4.0, 2.0, 1.0);
        for (p, uv) in g.positions.iter().zip(&g.uvs) {
            assert_eq!(uv[0], p[0] / 4.0);
            assert_eq!(uv[1], p[2] / 2.0);
            assert!((0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]));
        }
    }

    #[test]
    fn triangles_face_up() {
        let g = plane(3.0, 2.0, 1.0);
        for tri in g.positions.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(glam::Vec3::from);
            let n = (b - a).cross(c - a);
            assert!(n.y > 0.0, "triangle {tri:?} winds the wrong way");
        }
    }

    #[test]
    fn invalid_config_builds_nothing() {
        for cfg in [
            PlaneConfig::new(0.0, 1.0, 0.5),
            PlaneConfig::new(1.0, 0.0, 0.5),
            PlaneConfig::new(1.0, 1.0, -0.5),
            PlaneConfig::new(1.0, 1.0, 2.0),
        ] {
            assert!(matches!(build_plane(&cfg), Err(DeformError::InvalidConfig(_))));
        }
    }

    #[test]
    fn built_plane_passes_geometry_check() {
        let g = plane(5.0, 4.0, 1.0);
        assert_eq!(g.validate().unwrap(), 120);
    }

    #[test]
    fn mismatched_arrays_fail_geometry_check() {
        let mut g = plane(1.0, 1.0, 1.0);
        g.normals.truncate(3);
        assert!(matches!(g.validate(), Err(DeformError::InvalidConfig(_))));

        let mut g = plane(1.0, 1.0, 1.0);
        g.indices.pop();
        assert!(matches!(g.validate(), Err(DeformError::InvalidConfig(_))));
    }

    #[test]
    fn partial_triangle_fails_geometry_check() {
        let mut g = plane(1.0, 1.0, 1.0);
        g.positions.truncate(4);
        g.normals.truncate(4);
        g.uvs.truncate(4);
        g.indices.truncate(4);
        assert!(matches!(g.validate(), Err(DeformError::InvalidConfig(_))));
    }

    #[test]
    fn empty_geometry_is_valid() {
        let g = PlaneGeometry {
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
        };
        assert_eq!(g.validate().unwrap(), 0);
    }
}
