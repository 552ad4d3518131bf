use std::f64::consts::TAU;

use crate::Tolerance;
use crate::error::{InvariantViolation, MeshError};
use crate::mesh::wedge::{ANGLE_EPSILON, EdgeFrame, angular_distance, ccw_span, face_angle};
use crate::topology::store::{EdgeId, TopoStore};

/// Slack on the one-turn bound, for rounding in the summed steps.
const TURN_SLACK: f64 = 1e-6;

/// Face angles around `edge` in radial order, measured in the frame of the
/// edge's representative use. Wires are left out.
pub fn radial_angles(store: &TopoStore, edge: EdgeId, tol: &Tolerance, limit: usize) -> Result<Vec<f64>, MeshError> {
    let start = store.edge(edge)?.edge_use;
    let frame = EdgeFrame::from_edge_use(store, start, tol)?;
    let mut angles = Vec::new();
    for eu in store.radial_cycle(start, limit)? {
        if let Some(angle) = face_angle(store, eu, &frame, limit)? {
            angles.push(angle);
        }
    }
    Ok(angles)
}

/// How many times a closed sequence of angles winds counter-clockwise,
/// stepping from each to the next and back to the first. Steps between equal
/// angles count as zero.
///
/// A cycle sorted by angle winds exactly once (or zero times, if every angle
/// is the same); anything more means some step went backwards.
pub fn winding_turns(angles: &[f64]) -> f64 {
    if angles.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for (i, &a) in angles.iter().enumerate() {
        let b = angles[(i + 1) % angles.len()];
        if angular_distance(a, b) >= ANGLE_EPSILON {
            total += ccw_span(a, b);
        }
    }
    total / TAU
}

/// Check that the faces around `edge` appear in angular order.
pub fn verify_radial_monotone(store: &TopoStore, edge: EdgeId, tol: &Tolerance, limit: usize) -> Result<(), MeshError> {
    let turns = winding_turns(&radial_angles(store, edge, tol, limit)?);
    if turns > 1.0 + TURN_SLACK {
        return Err(InvariantViolation::NonMonotoneRadial { edge, turns }.into());
    }
    Ok(())
}
