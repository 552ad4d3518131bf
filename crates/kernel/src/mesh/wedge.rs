//! Angular bookkeeping around an edge.
//!
//! All faces meeting at an edge are measured in one frame erected on that
//! edge: `z` runs along the edge, `x` and `y` span the perpendicular plane.
//! A face's angular position is the direction of its "left" vector, the
//! in-plane vector pointing from the edge into the face's interior.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::Tolerance;
use crate::error::{MeshError, Precondition};
use crate::geometry::vector::Vec3;
use crate::topology::store::{EdgeUseId, TopoStore};

/// Angles closer than this (radians) are the same angle.
pub const ANGLE_EPSILON: f64 = 1e-8;

/// Below this squared sine the edge counts as parallel to the face normal.
const PARALLEL_SIN_SQ: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WedgeResult {
    EqualsA,
    EqualsB,
    Inside,
    Outside,
}

/// Classify angle `t` against the counter-clockwise wedge running from `a`
/// to `b`. All three angles are in `[0, 2π)`; when `b < a` the wedge wraps
/// through zero. A zero-width wedge (`a == b`) contains nothing but its
/// boundary.
pub fn angle_in_wedge(a: f64, b: f64, t: f64) -> WedgeResult {
    if angular_distance(a, t) < ANGLE_EPSILON {
        return WedgeResult::EqualsA;
    }
    if angular_distance(b, t) < ANGLE_EPSILON {
        return WedgeResult::EqualsB;
    }
    if angular_distance(a, b) < ANGLE_EPSILON {
        return WedgeResult::Outside;
    }
    if ccw_span(a, t) < ccw_span(a, b) {
        WedgeResult::Inside
    } else {
        WedgeResult::Outside
    }
}

/// Shortest distance between two angles on the circle.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

/// Counter-clockwise sweep from `a` to `b`, in `[0, 2π)`.
pub fn ccw_span(a: f64, b: f64) -> f64 {
    let d = (b - a).rem_euclid(TAU);
    if d >= TAU { 0.0 } else { d }
}

/// Orthonormal frame erected on an edge-use, `x × y = z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeFrame {
    pub x: Vec3,
    pub y: Vec3,
    /// Unit direction of the edge-use the frame was built from.
    pub z: Vec3,
}

impl EdgeFrame {
    /// Frame with `z` along `eu`. Zero-length edge-uses, topological or
    /// geometric, have no frame.
    pub fn from_edge_use(store: &TopoStore, eu: EdgeUseId, tol: &Tolerance) -> Result<Self, MeshError> {
        let (from, to) = store.endpoints(eu)?;
        if from == to {
            return Err(Precondition::ZeroLengthTopology {
                edge_use: eu,
                vertex: from,
            }
            .into());
        }
        let a = store.vertex(from)?.point;
        let b = store.vertex(to)?.point;
        let zero_length = || Precondition::ZeroLengthGeometry { edge_use: eu, from, to };
        if tol.points_coincident(&a, &b) {
            return Err(zero_length().into());
        }
        let z = (b - a).normalized().ok_or_else(zero_length)?;
        let x = z.any_perpendicular();
        let y = z.cross(&x);
        Ok(Self { x, y, z })
    }

    /// Angle of `v` measured from `x` towards `y`, in `[0, 2π)`.
    pub fn measure(&self, v: &Vec3) -> f64 {
        let angle = v.dot(&self.y).atan2(v.dot(&self.x));
        let angle = if angle < 0.0 { angle + TAU } else { angle };
        if angle >= TAU { 0.0 } else { angle }
    }
}

/// Unit vector in the plane of `eu`'s face, perpendicular to the edge and
/// pointing into the face. `None` for wire edge-uses.
///
/// Relies on outer loops running counter-clockwise and holes clockwise about
/// the face-use normal. Both uses of a face report the same vector.
pub fn left_vector(store: &TopoStore, eu: EdgeUseId, limit: usize) -> Result<Option<Vec3>, MeshError> {
    let Some(fu) = store.face_use_of(eu)? else {
        return Ok(None);
    };
    let normal = store.face_use_normal(fu)?;
    let (from, to) = store.endpoints(eu)?;
    let edge = store.vertex(to)?.point - store.vertex(from)?.point;
    let degenerate = || Precondition::DegenerateFace {
        face_use: fu,
        edge_use: eu,
    };

    let len_sq = edge.length_squared();
    if len_sq == 0.0 {
        return Err(degenerate().into());
    }
    let dot = edge.dot(&normal);
    let sin_sq = 1.0 - dot * dot / len_sq;
    if sin_sq > PARALLEL_SIN_SQ {
        let left = normal.cross(&edge).normalized().ok_or_else(degenerate)?;
        return Ok(Some(left));
    }

    // Edge runs along the normal: average what the neighbouring edges say.
    let ahead = neighbour_left(store, eu, &normal, true, limit)?;
    let behind = neighbour_left(store, eu, &normal, false, limit)?;
    match (ahead, behind) {
        (Some(a), Some(b)) => Ok(Some(((a + b) * 0.5).normalized().ok_or_else(degenerate)?)),
        _ => Err(degenerate().into()),
    }
}

/// Left vector of the nearest edge along the loop that is not itself
/// parallel to the normal, skipping uses of the same vertex pair.
fn neighbour_left(
    store: &TopoStore,
    eu: EdgeUseId,
    normal: &Vec3,
    forward: bool,
    limit: usize,
) -> Result<Option<Vec3>, MeshError> {
    let mut current = eu;
    for _ in 0..limit {
        let e = store.edge_use(current)?;
        let step = if forward { e.next } else { e.prev };
        store.hop(current, step)?;
        if step == eu {
            return Ok(None);
        }
        current = step;
        if store.edge_uses_adjacent(eu, current)? {
            continue;
        }
        let Some(dir) = store.direction(current)? else {
            continue;
        };
        let cos = dir.dot(normal);
        if 1.0 - cos * cos > PARALLEL_SIN_SQ {
            return Ok(normal.cross(&dir).normalized());
        }
    }
    Ok(None)
}

/// Angular position of `eu`'s face in `frame`. `None` for wires, which
/// callers must treat as unconstrained.
pub fn face_angle(
    store: &TopoStore,
    eu: EdgeUseId,
    frame: &EdgeFrame,
    limit: usize,
) -> Result<Option<f64>, MeshError> {
    Ok(left_vector(store, eu, limit)?.map(|left| frame.measure(&left)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    use crate::geometry::point::Point3d;
    use crate::topology::build::{add_vertex, make_face, make_shell, make_wire_edge};

    #[test]
    fn test_wedge_boundaries() {
        let a = 1.25;
        assert_eq!(angle_in_wedge(a, a, a), WedgeResult::EqualsA);
        assert_eq!(angle_in_wedge(a, a, a + 0.5), WedgeResult::Outside);
        assert_eq!(angle_in_wedge(0.0, PI, FRAC_PI_2), WedgeResult::Inside);
        assert_eq!(angle_in_wedge(0.0, PI, 3.0 * FRAC_PI_2), WedgeResult::Outside);
        assert_eq!(angle_in_wedge(0.0, PI, PI), WedgeResult::EqualsB);
        assert_eq!(angle_in_wedge(0.0, PI, 1e-10), WedgeResult::EqualsA);
    }

    #[test]
    fn test_wedge_wraps_through_zero() {
        assert_eq!(angle_in_wedge(3.0 * FRAC_PI_2, FRAC_PI_2, 0.0), WedgeResult::Inside);
        assert_eq!(angle_in_wedge(3.0 * FRAC_PI_2, FRAC_PI_2, PI), WedgeResult::Outside);
        // Just below 2π is the same angle as 0.
        assert_eq!(angle_in_wedge(0.0, PI, TAU - 1e-12), WedgeResult::EqualsA);
    }

    #[test]
    fn test_frame_is_right_handed() {
        let mut store = TopoStore::new();
        let s = make_shell(&mut store);
        let a = add_vertex(&mut store, Point3d::new(1.0, 2.0, 3.0));
        let b = add_vertex(&mut store, Point3d::new(2.0, 4.0, 5.0));
        let eu = make_wire_edge(&mut store, s, a, b).unwrap();
        let f = EdgeFrame::from_edge_use(&store, eu, &Tolerance::default()).unwrap();
        let z = f.x.cross(&f.y);
        assert_abs_diff_eq!(z.x, f.z.x, epsilon = 1e-12);
        assert_abs_diff_eq!(z.y, f.z.y, epsilon = 1e-12);
        assert_abs_diff_eq!(z.z, f.z.z, epsilon = 1e-12);
        assert_abs_diff_eq!(f.measure(&f.x), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.measure(&f.y), FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(f.measure(&-f.x), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(f.measure(&-f.y), 3.0 * FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_rejects_unfused_coincident_vertices() {
        let mut store = TopoStore::new();
        let s = make_shell(&mut store);
        let a = add_vertex(&mut store, Point3d::ORIGIN);
        let b = add_vertex(&mut store, Point3d::new(1e-5, 0.0, 0.0));
        let eu = make_wire_edge(&mut store, s, a, b).unwrap();
        let err = EdgeFrame::from_edge_use(&store, eu, &Tolerance::default()).unwrap_err();
        assert!(matches!(
            err,
            MeshError::PreconditionViolated(Precondition::ZeroLengthGeometry { .. })
        ));
    }

    #[test]
    fn test_both_face_uses_report_the_same_angle() {
        let mut store = TopoStore::new();
        let s = make_shell(&mut store);
        let a = add_vertex(&mut store, Point3d::new(0.0, 0.0, 0.0));
        let b = add_vertex(&mut store, Point3d::new(0.0, 0.0, 1.0));
        let c = add_vertex(&mut store, Point3d::new(1.0, 0.0, 0.5));
        let fu = make_face(&mut store, s, &[a, b, c]).unwrap();
        let eu = store.face_use_edge_uses(fu, 100).unwrap()[0];
        let mate = store.edge_uses[eu].mate;

        let left = left_vector(&store, eu, 100).unwrap().unwrap();
        assert_abs_diff_eq!(left.x, 1.0, epsilon = 1e-12);

        let frame = EdgeFrame::from_edge_use(&store, eu, &Tolerance::default()).unwrap();
        let t1 = face_angle(&store, eu, &frame, 100).unwrap().unwrap();
        let t2 = face_angle(&store, mate, &frame, 100).unwrap().unwrap();
        assert_abs_diff_eq!(t1, t2, epsilon = 1e-12);
    }

    #[test]
    fn test_wire_has_no_angle() {
        let mut store = TopoStore::new();
        let s = make_shell(&mut store);
        let a = add_vertex(&mut store, Point3d::ORIGIN);
        let b = add_vertex(&mut store, Point3d::new(0.0, 0.0, 1.0));
        let eu = make_wire_edge(&mut store, s, a, b).unwrap();
        let frame = EdgeFrame::from_edge_use(&store, eu, &Tolerance::default()).unwrap();
        assert_eq!(face_angle(&store, eu, &frame, 100).unwrap(), None);
    }
}
