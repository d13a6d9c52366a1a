//! Deformation diagnostics.
//!
//! Enabled by the `diagnostics` feature flag. Each deformer keeps a
//! [`DeformStats`] and updates it on every call; [`DeformStats::snapshot_json`]
//! serializes it for logging or an external monitor.

use serde::Serialize;

use crate::deform::DispatchPlan;
use crate::error::DeformResult;

/// Running counters for one deformer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeformStats {
    /// Calls that dispatched both passes.
    pub calls: u64,
    /// Calls that dispatched nothing: an empty mesh or a request that cannot
    /// move any vertex.
    pub skipped: u64,
    /// Times a mesh's compute bind groups were (re)built. The GPU backend
    /// builds them once per mesh; the CPU backend never does.
    pub bindings_built: u64,
    /// Sum of vertex counts over all dispatched calls.
    pub vertices_processed: u64,
    pub last_displacement: Option<DispatchPlan>,
    pub last_normals: Option<DispatchPlan>,
}

impl DeformStats {
    pub(crate) fn record(&mut self, vertex_count: u32, displacement: DispatchPlan, normals: DispatchPlan) {
        self.calls += 1;
        self.vertices_processed += vertex_count as u64;
        self.last_displacement = Some(displacement);
        self.last_normals = Some(normals);
    }

    pub(crate) fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn record_bindings(&mut self) {
        self.bindings_built += 1;
    }

    /// Serialize the counters as a JSON object.
    pub fn snapshot_json(&self) -> DeformResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
