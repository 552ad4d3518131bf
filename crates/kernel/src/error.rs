use thiserror::Error;

use crate::topology::store::{EdgeId, EdgeUseId, FaceUseId, VertexId};

/// Fatal failures of the meshing engine.
///
/// Both kinds abort the request that raised them; the caller (usually a
/// Boolean evaluator) decides whether to give up on the pair of solids or to
/// retry with a different tolerance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// The caller, or an earlier construction/fusing phase, handed over
    /// topology the engine must not work around.
    #[error("precondition violated: {0}")]
    PreconditionViolated(#[from] Precondition),

    /// The topology graph itself is corrupt.
    #[error("topology invariant violated: {0}")]
    TopologyInvariantViolated(#[from] InvariantViolation),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Precondition {
    #[error("edge-uses {eu1:?} and {eu2:?} do not share an endpoint vertex pair")]
    NotAdjacent { eu1: EdgeUseId, eu2: EdgeUseId },

    #[error("edge-use {edge_use:?} starts and ends at vertex {vertex:?}")]
    ZeroLengthTopology { edge_use: EdgeUseId, vertex: VertexId },

    #[error(
        "edge-use {edge_use:?} has distinct vertices {from:?} and {to:?} at coincident positions (vertices not fused)"
    )]
    ZeroLengthGeometry {
        edge_use: EdgeUseId,
        from: VertexId,
        to: VertexId,
    },

    #[error("face-use {face_use:?} has no edge usable for a left vector at edge-use {edge_use:?}")]
    DegenerateFace {
        face_use: FaceUseId,
        edge_use: EdgeUseId,
    },

    #[error("boundary {vertices:?} is degenerate (fewer than three distinct corners, repeated or collinear)")]
    DegenerateBoundary { vertices: Vec<VertexId> },

    #[error("handle {handle} does not refer to a live {kind}")]
    StaleHandle { kind: &'static str, handle: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("traversal starting at edge-use {start:?} exceeded {limit} steps")]
    IterationLimit { start: EdgeUseId, limit: usize },

    #[error("radial walk from edge-use {start:?} returned to it on a radial step")]
    OddRadialCycle { start: EdgeUseId },

    #[error("no angular slot for edge-use {candidate:?} around edge {edge:?}")]
    NoInsertionSlot { edge: EdgeId, candidate: EdgeUseId },

    #[error("{kind} {handle} referenced from {from} no longer exists")]
    DanglingReference {
        kind: &'static str,
        handle: String,
        from: String,
    },

    #[error("faces around edge {edge:?} wind {turns:.3} turns instead of one")]
    NonMonotoneRadial { edge: EdgeId, turns: f64 },
}

impl MeshError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, MeshError::PreconditionViolated(_))
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, MeshError::TopologyInvariantViolated(_))
    }
}
