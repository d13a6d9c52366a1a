//! Host-side glue between input events and the deformer.
//!
//! Input code holds an `Arc<PendingDeform>` and writes requests whenever a
//! touch lands. The frame loop calls [`DeformSession::tick`] once per frame,
//! which drains the slot and runs at most one deformation. Touches arriving
//! faster than frames collapse to the latest.

use std::sync::Arc;

use crate::config::PlaneConfig;
use crate::deform::{DeformRequest, MeshDeformer, PendingDeform};
use crate::error::DeformResult;
use crate::mesh::build_plane;

/// A deformer plus the mesh it currently works on.
pub struct DeformSession<D: MeshDeformer> {
    deformer: D,
    mesh: D::Mesh,
    plane: PlaneConfig,
    pending: Arc<PendingDeform>,
}

impl<D: MeshDeformer> DeformSession<D> {
    /// Build the initial plane and allocate it on `deformer`'s backend.
    pub fn new(deformer: D, plane: &PlaneConfig) -> DeformResult<Self> {
        let mesh = deformer.build_mesh(&build_plane(plane)?)?;
        log::info!("Deform session started on '{}' backend", deformer.name());
        Ok(Self {
            deformer,
            mesh,
            plane: *plane,
            pending: Arc::new(PendingDeform::new()),
        })
    }

    /// Shared slot for input code.
    pub fn pending(&self) -> Arc<PendingDeform> {
        Arc::clone(&self.pending)
    }

    /// Queue a request for the next tick, replacing any unprocessed one.
    pub fn submit(&self, request: DeformRequest) {
        if self.pending.submit(request).is_some() {
            log::trace!("pending deform replaced before it ran");
        }
    }

    /// Run the pending request, if any. Returns `true` when a deformation ran.
    pub fn tick(&mut self) -> DeformResult<bool> {
        let Some(request) = self.pending.take() else {
            return Ok(false);
        };
        self.deformer.deform(&mut self.mesh, &request)?;
        Ok(true)
    }

    /// Replace the mesh with a freshly built plane.
    ///
    /// The old mesh is dropped with all of its buffers and any request aimed
    /// at it is discarded. On error the current mesh is kept.
    pub fn rebuild(&mut self, plane: &PlaneConfig) -> DeformResult<()> {
        let mesh = self.deformer.build_mesh(&build_plane(plane)?)?;
        self.pending.clear();
        self.mesh = mesh;
        self.plane = *plane;
        Ok(())
    }

    pub fn plane(&self) -> &PlaneConfig {
        &self.plane
    }

    pub fn mesh(&self) -> &D::Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut D::Mesh {
        &mut self.mesh
    }

    pub fn deformer(&self) -> &D {
        &self.deformer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeformerConfig;
    use crate::deform::CpuDeformer;
    use glam::Vec3;

    fn session(plane: PlaneConfig) -> DeformSession<CpuDeformer> {
        let deformer = CpuDeformer::new(DeformerConfig::default()).unwrap();
        DeformSession::new(deformer, &plane).unwrap()
    }

    fn push_at(location: Vec3) -> DeformRequest {
        DeformRequest::new(location, Vec3::Y, 16.0, 1.5)
    }

    #[test]
    fn tick_without_request_does_nothing() {
        let mut session = session(PlaneConfig::new(10.0, 10.0, 1.0));
        assert!(!session.tick().unwrap());
        assert!(session.mesh().positions().iter().all(|p| p[1] == 0.0));
    }

    #[test]
    fn tick_drains_and_deforms() {
        let mut session = session(PlaneConfig::new(10.0, 10.0, 1.0));
        session.submit(push_at(Vec3::new(5.0, 0.0, 5.0)));
        assert!(session.tick().unwrap());
        assert!(!session.pending().is_pending());
        let peak = session.mesh().positions().iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert!((peak - 1.5).abs() < 1e-5);
        assert!(!session.tick().unwrap());
    }

    #[test]
    fn latest_request_wins() {
        let mut session = session(PlaneConfig::new(10.0, 10.0, 1.0));
        let slot = session.pending();
        slot.submit(push_at(Vec3::new(1.0, 0.0, 1.0)));
        slot.submit(push_at(Vec3::new(9.0, 0.0, 9.0)));
        assert!(session.tick().unwrap());

        let positions = session.mesh().positions();
        let height_at = |x: f32, z: f32| {
            positions
                .iter()
                .find(|p| p[0] == x && p[2] == z)
                .map(|p| p[1])
                .unwrap()
        };
        assert_eq!(height_at(1.0, 1.0), 0.0);
        assert!((height_at(9.0, 9.0) - 1.5).abs() < 1e-5);
    }

    #[test]
    fn rebuild_resets_mesh_and_clears_pending() {
        let mut session = session(PlaneConfig::new(10.0, 10.0, 1.0));
        session.submit(push_at(Vec3::new(5.0, 0.0, 5.0)));
        session.tick().unwrap();
        session.submit(push_at(Vec3::new(5.0, 0.0, 5.0)));

        session.rebuild(&PlaneConfig::new(4.0, 2.0, 1.0)).unwrap();
        assert!(!session.pending().is_pending());
        assert_eq!(session.mesh().vertex_count(), 4 * 2 * 6);
        assert!(session.mesh().positions().iter().all(|p| p[1] == 0.0));
        assert_eq!(session.plane().width, 4.0);
    }

    #[test]
    fn failed_rebuild_keeps_current_mesh() {
        let mut session = session(PlaneConfig::new(10.0, 10.0, 1.0));
        assert!(session.rebuild(&PlaneConfig::new(0.0, 10.0, 1.0)).is_err());
        assert_eq!(session.mesh().vertex_count(), 600);
    }
}
