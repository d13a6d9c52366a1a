//! Deformation requests and the single pending-request slot.
//!
//! Input code produces at most one meaningful request per frame. Requests are
//! never queued: a new touch overwrites whatever the render tick has not yet
//! consumed, and the tick drains the slot when it deforms.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::BrushConfig;
use crate::math::{Transform, Vec3};

/// One touch's worth of deformation, in mesh-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeformRequest {
    /// Centre of the influence sphere.
    pub location: Vec3,
    /// Push direction. Normalised when packed for the GPU.
    pub direction: Vec3,
    /// Squared influence radius.
    pub radius_squared: f32,
    /// Displacement applied at the centre.
    pub amplitude: f32,
}

impl DeformRequest {
    pub fn new(location: Vec3, direction: Vec3, radius_squared: f32, amplitude: f32) -> Self {
        Self {
            location,
            direction,
            radius_squared,
            amplitude,
        }
    }

    /// Build a request from a mesh-local hit and the configured brush.
    pub fn with_brush(location: Vec3, direction: Vec3, brush: &BrushConfig) -> Self {
        Self::new(location, direction, brush.radius_squared, brush.amplitude)
    }

    /// Build a request from a world-space hit point and push direction,
    /// mapped into the mesh's local space through its `transform`.
    pub fn from_world(transform: &Transform, point: Vec3, direction: Vec3, brush: &BrushConfig) -> Self {
        Self::with_brush(
            transform.world_to_local_point(point),
            transform.world_to_local_direction(direction),
            brush,
        )
    }

    /// `true` when the request cannot move any vertex.
    pub fn is_noop(&self) -> bool {
        self.amplitude == 0.0 || self.radius_squared <= 0.0 || self.direction == Vec3::ZERO
    }
}

/// Latest-wins slot holding at most one unconsumed request.
///
/// Shared between an input producer and the render tick; the lock only
/// guards a swap, so neither side ever waits on GPU work.
#[derive(Debug, Default)]
pub struct PendingDeform {
    slot: Mutex<Option<DeformRequest>>,
}

impl PendingDeform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `request`, replacing any request not yet consumed.
    ///
    /// Returns the request that was dropped, if any.
    pub fn submit(&self, request: DeformRequest) -> Option<DeformRequest> {
        self.lock().replace(request)
    }

    /// Drain the slot.
    pub fn take(&self) -> Option<DeformRequest> {
        self.lock().take()
    }

    /// Discard any pending request.
    pub fn clear(&self) {
        self.lock().take();
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<DeformRequest>> {
        // A poisoned slot still holds a valid Option; keep using it.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn request(x: f32) -> DeformRequest {
        DeformRequest::new(Vec3::new(x, 0.0, 0.0), Vec3::Y, 4.0, 1.0)
    }

    #[test]
    fn latest_request_wins() {
        let slot = PendingDeform::new();
        assert!(slot.submit(request(1.0)).is_none());
        let dropped = slot.submit(request(2.0));
        assert_eq!(dropped, Some(request(1.0)));
        assert_eq!(slot.take(), Some(request(2.0)));
    }

    #[test]
    fn take_drains_the_slot() {
        let slot = PendingDeform::new();
        slot.submit(request(1.0));
        assert!(slot.is_pending());
        assert!(slot.take().is_some());
        assert!(!slot.is_pending());
        assert!(slot.take().is_none());
    }

    #[test]
    fn clear_discards_pending() {
        let slot = PendingDeform::new();
        slot.submit(request(3.0));
        slot.clear();
        assert!(slot.take().is_none());
    }

    #[test]
    fn producers_on_other_threads_overwrite() {
        let slot = Arc::new(PendingDeform::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || {
                    slot.submit(request(i as f32));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // Exactly one request survives, no backlog.
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
    }

    #[test]
    fn brush_fills_radius_and_amplitude() {
        let brush = BrushConfig::default();
        let r = DeformRequest::with_brush(Vec3::ZERO, Vec3::Y, &brush);
        assert_eq!(r.radius_squared, 16.0);
        assert_eq!(r.amplitude, 1.5);
    }

    #[test]
    fn from_world_maps_into_local_space() {
        let t = Transform::from_xyz(5.0, 0.0, 0.0);
        let r = DeformRequest::from_world(&t, Vec3::new(6.0, 0.0, 2.0), Vec3::Y, &BrushConfig::default());
        assert!((r.location - Vec3::new(1.0, 0.0, 2.0)).length() < 1e-5);
        assert!((r.direction - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn noop_detection() {
        assert!(DeformRequest::new(Vec3::ZERO, Vec3::Y, 4.0, 0.0).is_noop());
        assert!(DeformRequest::new(Vec3::ZERO, Vec3::Y, 0.0, 1.0).is_noop());
        assert!(DeformRequest::new(Vec3::ZERO, Vec3::ZERO, 4.0, 1.0).is_noop());
        assert!(!request(0.0).is_noop());
    }

    #[test]
    fn request_serializes_to_json() {
        let r = request(1.5);
        let json = serde_json::to_string(&r).unwrap();
        let back: DeformRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
