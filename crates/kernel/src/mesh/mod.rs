//! Edge meshing: turning separately built but coincident edges into single
//! radial-edge edges, ready for Boolean face classification.

pub mod config;
pub mod geom;
pub mod orchestrate;
pub mod radial;
pub mod trace;
pub mod wedge;

pub use config::MeshConfig;
pub use geom::{fuse_face_geometry, pick_best_edge_geometry};
pub use radial::{JoinOutcome, ToleranceAmbiguity};
pub use trace::{FanEntry, NoopSink, TraceSink, TracingSink};
pub use wedge::{EdgeFrame, WedgeResult, angle_in_wedge, face_angle};

use crate::Tolerance;
use crate::error::MeshError;
use crate::topology::store::{EdgeUseId, FaceUseId, ShellId, TopoStore};

/// The meshing engine.
///
/// Holds the configuration and the sink for one or more meshing calls. The
/// store is borrowed mutably per call, never owned.
pub struct Mesher<S: TraceSink = NoopSink> {
    config: MeshConfig,
    sink: S,
}

impl Mesher<NoopSink> {
    pub fn new(config: MeshConfig) -> Self {
        Self { config, sink: NoopSink }
    }
}

impl Default for Mesher<NoopSink> {
    fn default() -> Self {
        Self::new(MeshConfig::default())
    }
}

impl<S: TraceSink> Mesher<S> {
    pub fn with_sink(config: MeshConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

fn mesher(tol: &Tolerance) -> Mesher {
    Mesher::new(MeshConfig::with_tolerance(*tol))
}

/// Merge `eu2`'s edge into `eu1`'s edge with default settings.
pub fn radial_join(
    store: &mut TopoStore,
    eu1: EdgeUseId,
    eu2: EdgeUseId,
    tol: &Tolerance,
) -> Result<JoinOutcome, MeshError> {
    mesher(tol).radial_join(store, eu1, eu2)
}

/// Join every pair of coincident edges between two face-uses. Returns the
/// number of edges merged.
pub fn mesh_two_faces(
    store: &mut TopoStore,
    fu1: FaceUseId,
    fu2: FaceUseId,
    tol: &Tolerance,
) -> Result<usize, MeshError> {
    mesher(tol).mesh_two_faces(store, fu1, fu2)
}

pub fn mesh_faces(store: &mut TopoStore, fu1: FaceUseId, fu2: FaceUseId, tol: &Tolerance) -> Result<usize, MeshError> {
    mesher(tol).mesh_faces(store, fu1, fu2)
}

pub fn mesh_face_shell(
    store: &mut TopoStore,
    fu1: FaceUseId,
    shell: ShellId,
    tol: &Tolerance,
) -> Result<usize, MeshError> {
    mesher(tol).mesh_face_shell(store, fu1, shell)
}

pub fn mesh_shell_shell(store: &mut TopoStore, s1: ShellId, s2: ShellId, tol: &Tolerance) -> Result<usize, MeshError> {
    mesher(tol).mesh_shell_shell(store, s1, s2)
}
