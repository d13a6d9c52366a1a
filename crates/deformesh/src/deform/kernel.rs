//! CPU versions of the two compute kernels.
//!
//! These mirror `displace.wgsl` and `normals.wgsl` line for line so the CPU
//! deformer produces the same numbers as the GPU one, lane by lane.

use super::params::DeformParams;
use crate::math::{Vec3, face_normal};

/// Attenuation by distance: `1` at the centre, `0` at the radius.
///
/// Inverted smoothstep of the normalised distance `t = d / r`:
/// `1 - t²(3 - 2t)`. Continuous, with zero slope at both ends, so the dent
/// blends into the flat surface without a visible crease. Callers only
/// evaluate it strictly inside the radius.
pub fn falloff(distance_squared: f32, radius_squared: f32) -> f32 {
    let t = (distance_squared / radius_squared).sqrt().clamp(0.0, 1.0);
    1.0 - t * t * (3.0 - 2.0 * t)
}

/// Displacement kernel for a single vertex.
pub fn displace_vertex(position: Vec3, params: &DeformParams) -> Vec3 {
    let location = Vec3::from(params.location);
    let offset = position - location;
    let distance_squared = offset.dot(offset);
    if distance_squared < params.radius_squared {
        let weight = params.amplitude * falloff(distance_squared, params.radius_squared);
        position + Vec3::from(params.direction) * weight
    } else {
        position
    }
}

/// Normal kernel for one lane of a group.
///
/// `corners` is the group's staged positions; `lane` is this invocation's
/// local index. Returns the face normal of the triangle the lane belongs to.
pub fn lane_normal(corners: &[Vec3], lane: usize) -> Vec3 {
    let first = lane - lane % 3;
    face_normal(corners[first], corners[first + 1], corners[first + 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deform::DeformRequest;

    fn params(amplitude: f32, radius_squared: f32) -> DeformParams {
        DeformParams::from(&DeformRequest::new(Vec3::ZERO, Vec3::Y, radius_squared, amplitude))
    }

    #[test]
    fn falloff_endpoints() {
        assert_eq!(falloff(0.0, 4.0), 1.0);
        assert!(falloff(4.0, 4.0).abs() < 1e-6);
    }

    #[test]
    fn falloff_is_monotonic_and_bounded() {
        let mut prev = 1.0;
        for i in 1..=100 {
            let d = i as f32 / 100.0;
            let f = falloff(d * d, 1.0);
            assert!(f <= prev + 1e-6, "falloff rose at {d}");
            assert!((0.0..=1.0).contains(&f));
            prev = f;
        }
    }

    #[test]
    fn falloff_half_radius_is_half() {
        assert!((falloff(0.25, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn centre_moves_by_full_amplitude() {
        let p = displace_vertex(Vec3::ZERO, &params(2.0, 9.0));
        assert!((p - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn boundary_vertex_does_not_move() {
        let p = Vec3::new(3.0, 0.0, 0.0);
        assert_eq!(displace_vertex(p, &params(2.0, 9.0)), p);
    }

    #[test]
    fn just_inside_boundary_moves_negligibly() {
        let p = Vec3::new(2.999, 0.0, 0.0);
        let moved = displace_vertex(p, &params(2.0, 9.0));
        assert!((moved - p).length() < 1e-5);
    }

    #[test]
    fn zero_amplitude_or_radius_is_identity() {
        let p = Vec3::new(0.5, 0.0, 0.5);
        assert_eq!(displace_vertex(p, &params(0.0, 9.0)), p);
        assert_eq!(displace_vertex(p, &params(2.0, 0.0)), p);
        assert_eq!(displace_vertex(Vec3::ZERO, &params(2.0, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn lane_normal_uses_own_triangle() {
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            // second triangle tilted
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        for lane in 0..3 {
            assert!((lane_normal(&corners, lane) - Vec3::Y).length() < 1e-6);
        }
        let tilted = lane_normal(&corners, 4);
        assert_eq!(tilted, lane_normal(&corners, 3));
        assert_eq!(tilted, lane_normal(&corners, 5));
        assert!(tilted.x < 0.0 && tilted.y > 0.0);
    }
}
