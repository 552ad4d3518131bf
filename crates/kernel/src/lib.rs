pub mod error;
pub mod geometry;
pub mod topology;
pub mod mesh;
pub mod validation;

use serde::{Deserialize, Serialize};

// Re-export the engine surface at crate root for convenience.
pub use error::{InvariantViolation, MeshError, Precondition};
pub use mesh::{
    JoinOutcome, MeshConfig, Mesher, NoopSink, ToleranceAmbiguity, TraceSink, TracingSink,
    mesh_face_shell, mesh_faces, mesh_shell_shell, mesh_two_faces, radial_join,
};
pub use topology::store::TopoStore;

/// Geometric fuzz used for "same point" and "same direction" decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub dist: f64,
    /// `dist * dist`, kept alongside to avoid square roots in hot comparisons.
    pub dist_sq: f64,
    /// Cosine below which two directions count as perpendicular.
    pub perp: f64,
    /// Cosine above which two directions count as parallel (`1 - perp`).
    pub para: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(0.0005, 1e-6)
    }
}

impl Tolerance {
    pub fn new(dist: f64, perp: f64) -> Self {
        Self {
            dist,
            dist_sq: dist * dist,
            perp,
            para: 1.0 - perp,
        }
    }

    pub fn points_coincident(&self, a: &geometry::point::Point3d, b: &geometry::point::Point3d) -> bool {
        a.distance_squared_to(b) < self.dist_sq
    }

    /// True when the cosine between two unit directions says they are parallel
    /// (or anti-parallel).
    pub fn is_parallel(&self, cosine: f64) -> bool {
        cosine.abs() >= self.para
    }
}
