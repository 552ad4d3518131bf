//! Configuration for the meshing engine.

use serde::{Deserialize, Serialize};

use crate::Tolerance;

/// Bound on every walk around a cyclic list (radial cycles, loops).
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Knobs controlling one `Mesher`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Geometric fuzz for coincident points and parallel normals.
    pub tolerance: Tolerance,
    /// Steps allowed per traversal before the topology is declared corrupt.
    pub max_iterations: usize,
    /// Try to fuse the plane geometry of faces that tie in angle.
    pub fuse_ambiguous_faces: bool,
    /// Re-check the angular order of every merged radial cycle.
    pub verify_monotone: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            fuse_ambiguous_faces: true,
            verify_monotone: false,
        }
    }
}

impl MeshConfig {
    pub fn with_tolerance(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    /// Verify every merged cycle; slower, for tests and debug builds.
    pub fn strict() -> Self {
        Self {
            verify_monotone: true,
            ..Self::default()
        }
    }

    /// Never touch face geometry; angle ties are resolved by placement alone.
    pub fn best_effort() -> Self {
        Self {
            fuse_ambiguous_faces: false,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
