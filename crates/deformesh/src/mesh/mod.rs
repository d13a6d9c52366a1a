//! Plane generation, vertex stream layouts and GPU mesh storage.

pub mod gpu_mesh;
pub mod plane;
pub mod vertex;

pub use gpu_mesh::DeformableMesh;
pub use plane::{PlaneGeometry, build_plane};
pub use vertex::{INDEX_FORMAT, TOPOLOGY, vertex_layouts};
