//! Settings for the plane, the touch brush and the deformer.
//!
//! All three sections deserialize with `#[serde(default)]`, so a settings
//! file only needs the values it changes:
//!
//! ```json
//! { "plane": { "width": 40.0, "length": 40.0, "step": 0.5 } }
//! ```
//!
//! Values are validated after loading; an invalid file never produces a mesh.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DeformError, DeformResult};

/// Extents and sampling step of the tessellated plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneConfig {
    pub width: f32,
    pub length: f32,
    pub step: f32,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            width: 150.0,
            length: 70.0,
            step: 1.0,
        }
    }
}

impl PlaneConfig {
    pub fn new(width: f32, length: f32, step: f32) -> Self {
        Self { width, length, step }
    }

    /// Vertices the tessellated plane will have (six per whole cell).
    ///
    /// Saturates instead of overflowing for absurd extents.
    pub fn vertex_count(&self) -> u64 {
        let cells_x = crate::mesh::plane::cell_count(self.width, self.step);
        let cells_z = crate::mesh::plane::cell_count(self.length, self.step);
        cells_x.saturating_mul(cells_z).saturating_mul(6)
    }

    /// Reject extents or steps that cannot produce at least one grid cell, or
    /// that produce more vertices than 32-bit indices can address.
    ///
    /// Device buffer limits are checked when the mesh is allocated.
    pub fn validate(&self) -> DeformResult<()> {
        for (name, value) in [("width", self.width), ("length", self.length), ("step", self.step)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DeformError::config(format!("plane {name} must be positive, got {value}")));
            }
        }
        if self.step > self.width || self.step > self.length {
            return Err(DeformError::config(format!(
                "plane step {} exceeds extents {} x {}; no triangles would be produced",
                self.step, self.width, self.length
            )));
        }
        let vertices = self.vertex_count();
        if vertices > u64::from(u32::MAX) {
            return Err(DeformError::config(format!(
                "plane {} x {} step {} needs {vertices} vertices; at most {} are addressable",
                self.width,
                self.length,
                self.step,
                u32::MAX
            )));
        }
        Ok(())
    }
}

/// Influence radius and strength applied to each touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub radius_squared: f32,
    pub amplitude: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius_squared: 16.0,
            amplitude: 1.5,
        }
    }
}

impl BrushConfig {
    pub fn validate(&self) -> DeformResult<()> {
        if !self.radius_squared.is_finite() || self.radius_squared < 0.0 {
            return Err(DeformError::config(format!(
                "brush radius_squared must be non-negative, got {}",
                self.radius_squared
            )));
        }
        if !self.amplitude.is_finite() {
            return Err(DeformError::config(format!(
                "brush amplitude must be finite, got {}",
                self.amplitude
            )));
        }
        Ok(())
    }
}

/// Deformer tuning.
///
/// wgpu does not report a per-pipeline execution width the way Metal does,
/// so the displacement pass width is configured here and clamped to the
/// device's compute limits when the deformer is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeformerConfig {
    pub execution_width: u32,
}

impl Default for DeformerConfig {
    fn default() -> Self {
        Self { execution_width: 64 }
    }
}

impl DeformerConfig {
    pub fn validate(&self) -> DeformResult<()> {
        if self.execution_width == 0 {
            return Err(DeformError::config("deformer execution_width must be at least 1"));
        }
        Ok(())
    }
}

/// Top-level settings document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub plane: PlaneConfig,
    pub brush: BrushConfig,
    pub deformer: DeformerConfig,
}

impl Settings {
    /// Parse and validate settings from a JSON string.
    pub fn from_json_str(json: &str) -> DeformResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> DeformResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> DeformResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> DeformResult<()> {
        self.plane.validate()?;
        self.brush.validate()?;
        self.deformer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_scene() {
        let s = Settings::default();
        assert_eq!(s.plane, PlaneConfig::new(150.0, 70.0, 1.0));
        assert_eq!(s.brush.radius_squared, 16.0);
        assert_eq!(s.brush.amplitude, 1.5);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_plane_values() {
        assert!(PlaneConfig::new(0.0, 10.0, 1.0).validate().is_err());
        assert!(PlaneConfig::new(10.0, -1.0, 1.0).validate().is_err());
        assert!(PlaneConfig::new(10.0, 10.0, 0.0).validate().is_err());
        assert!(PlaneConfig::new(10.0, 10.0, f32::NAN).validate().is_err());
    }

    #[test]
    fn rejects_step_larger_than_extent() {
        let err = PlaneConfig::new(10.0, 5.0, 6.0).validate().unwrap_err();
        assert!(matches!(err, DeformError::InvalidConfig(_)));
        assert!(PlaneConfig::new(10.0, 10.0, 10.0).validate().is_ok());
    }

    #[test]
    fn counts_vertices_before_building() {
        assert_eq!(PlaneConfig::default().vertex_count(), 6 * 150 * 70);
        assert_eq!(PlaneConfig::new(1.0, 1.0, 0.1).vertex_count(), 600);
    }

    #[test]
    fn rejects_plane_beyond_index_range() {
        let cfg = PlaneConfig::new(1.0e6, 1.0e6, 1.0);
        assert!(cfg.vertex_count() > u64::from(u32::MAX));
        assert!(matches!(cfg.validate(), Err(DeformError::InvalidConfig(_))));
        assert!(PlaneConfig::new(f32::MAX, f32::MAX, f32::MIN_POSITIVE).validate().is_err());
    }

    #[test]
    fn rejects_negative_radius() {
        let brush = BrushConfig {
            radius_squared: -1.0,
            amplitude: 1.0,
        };
        assert!(brush.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = Settings::from_json_str(r#"{ "plane": { "width": 40.0 } }"#).unwrap();
        assert_eq!(s.plane.width, 40.0);
        assert_eq!(s.plane.length, 70.0);
        assert_eq!(s.deformer.execution_width, 64);
    }

    #[test]
    fn invalid_json_values_are_rejected_after_parse() {
        let err = Settings::from_json_str(r#"{ "plane": { "step": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, DeformError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = Settings::from_json_str("{ plane: ").unwrap_err();
        assert!(matches!(err, DeformError::Serialization(_)));
    }

    #[test]
    fn json_round_trip_preserves_settings() {
        let mut s = Settings::default();
        s.deformer.execution_width = 32;
        let parsed = Settings::from_json_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn load_reports_missing_file_as_io_error() {
        let err = Settings::load("/definitely/not/here/settings.json").unwrap_err();
        assert!(matches!(err, DeformError::Io(_)));
    }
}
