//! Face construction operators.
//!
//! These stand in for the tessellation/face-construction phase that feeds the
//! mesher. They never fuse vertices: faces built from the same `VertexId`s
//! share vertices, faces built from distinct ids do not, whatever their
//! coordinates.

use tracing::{debug, instrument};

use super::store::*;
use crate::error::{MeshError, Precondition};
use crate::geometry::line::EdgeLine;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;

pub fn add_vertex(store: &mut TopoStore, point: Point3d) -> VertexId {
    store.vertices.insert(Vertex { point })
}

pub fn make_shell(store: &mut TopoStore) -> ShellId {
    store.shells.insert(Shell::default())
}

/// Make a planar face from a counter-clockwise (seen from outside) list of
/// vertices. Returns the `Same` face-use; its mate carries the reversed loop.
#[instrument(skip(store, vertices), fields(corners = vertices.len()))]
pub fn make_face(store: &mut TopoStore, shell: ShellId, vertices: &[VertexId]) -> Result<FaceUseId, MeshError> {
    store.shell(shell)?;
    let points = boundary_points(store, vertices)?;
    let plane = Plane::from_polygon(&points).ok_or_else(|| Precondition::DegenerateBoundary {
        vertices: vertices.to_vec(),
    })?;

    let plane_id = store.planes.insert(plane);
    let face_id = store.faces.insert(Face {
        geom: plane_id,
        flip: false,
        face_use: FaceUseId::default(),
    });
    let fu = store.face_uses.insert(FaceUse {
        face: face_id,
        mate: FaceUseId::default(),
        orientation: Orientation::Same,
        shell,
        loops: vec![],
    });
    let fu_mate = store.face_uses.insert(FaceUse {
        face: face_id,
        mate: fu,
        orientation: Orientation::Opposite,
        shell,
        loops: vec![],
    });
    store.face_uses[fu].mate = fu_mate;
    store.faces[face_id].face_use = fu;
    store.shells[shell].face_uses.extend([fu, fu_mate]);

    attach_loop(store, fu, vertices)?;

    debug!(?face_id, ?fu, "make_face created face");
    Ok(fu)
}

/// Add an inner (hole) loop to a face. The vertex order is corrected so the
/// hole runs clockwise about the face-use's normal.
#[instrument(skip(store, vertices), fields(corners = vertices.len()))]
pub fn add_hole(store: &mut TopoStore, fu: FaceUseId, vertices: &[VertexId]) -> Result<LoopUseId, MeshError> {
    let normal = store.face_use_normal(fu)?;
    let points = boundary_points(store, vertices)?;
    let hole = Plane::from_polygon(&points).ok_or_else(|| Precondition::DegenerateBoundary {
        vertices: vertices.to_vec(),
    })?;

    let mut ordered = vertices.to_vec();
    if hole.normal.dot(&normal) > 0.0 {
        ordered.reverse();
    }
    let lu = attach_loop(store, fu, &ordered)?;
    debug!(?lu, "add_hole attached inner loop");
    Ok(lu)
}

/// Add a self-loop (a lone vertex) to a face.
pub fn add_vertex_loop(store: &mut TopoStore, fu: FaceUseId, vertex: VertexId) -> Result<LoopUseId, MeshError> {
    store.vertex(vertex)?;
    let (fu, fu_mate, orientation, mate_orientation) = face_use_pair(store, fu)?;

    let lp = store.loops.insert(Loop {
        loop_use: LoopUseId::default(),
    });
    let lu = store.loop_uses.insert(LoopUse {
        lp,
        mate: LoopUseId::default(),
        face_use: fu,
        orientation,
        kind: LoopKind::Vertex(vertex),
    });
    let lu_mate = store.loop_uses.insert(LoopUse {
        lp,
        mate: lu,
        face_use: fu_mate,
        orientation: mate_orientation,
        kind: LoopKind::Vertex(vertex),
    });
    store.loop_uses[lu].mate = lu_mate;
    store.loops[lp].loop_use = lu;
    store.face_uses[fu].loops.push(lu);
    store.face_uses[fu_mate].loops.push(lu_mate);
    Ok(lu)
}

/// Make a faceless edge between two vertices of a shell. Returns the use
/// running `v1 -> v2`.
#[instrument(skip(store))]
pub fn make_wire_edge(
    store: &mut TopoStore,
    shell: ShellId,
    v1: VertexId,
    v2: VertexId,
) -> Result<EdgeUseId, MeshError> {
    store.shell(shell)?;
    if v1 == v2 {
        return Err(Precondition::DegenerateBoundary { vertices: vec![v1, v2] }.into());
    }
    let p1 = store.vertex(v1)?.point;
    let p2 = store.vertex(v2)?.point;

    let parent = EdgeUseParent::Wire(shell);
    let (eu, mate) = make_edge(store, v1, v2, p1, p2, parent, parent);
    for id in [eu, mate] {
        let e = &mut store.edge_uses[id];
        e.next = id;
        e.prev = id;
    }
    store.shells[shell].wire_edge_uses.push(eu);

    debug!(?eu, ?mate, "make_wire_edge created wire");
    Ok(eu)
}

// ─── Internals ───────────────────────────────────────────────────────────────

fn boundary_points(store: &TopoStore, vertices: &[VertexId]) -> Result<Vec<Point3d>, MeshError> {
    let n = vertices.len();
    let repeated = (0..n).any(|i| vertices[i] == vertices[(i + 1) % n]);
    if n < 3 || repeated {
        return Err(Precondition::DegenerateBoundary {
            vertices: vertices.to_vec(),
        }
        .into());
    }
    vertices
        .iter()
        .map(|&v| store.vertex(v).map(|vx| vx.point))
        .collect()
}

fn face_use_pair(
    store: &TopoStore,
    fu: FaceUseId,
) -> Result<(FaceUseId, FaceUseId, Orientation, Orientation), MeshError> {
    let face_use = store.face_use(fu)?;
    let mate = store.face_use(face_use.mate)?;
    Ok((fu, face_use.mate, face_use.orientation, mate.orientation))
}

/// Create an edge with one use pair. The pair starts as its own radial cycle.
fn make_edge(
    store: &mut TopoStore,
    v1: VertexId,
    v2: VertexId,
    p1: Point3d,
    p2: Point3d,
    parent: EdgeUseParent,
    mate_parent: EdgeUseParent,
) -> (EdgeUseId, EdgeUseId) {
    let geom = EdgeLine::from_points(p1, p2).map(|line| store.edge_lines.insert(line));
    let edge = store.edges.insert(Edge {
        edge_use: EdgeUseId::default(),
    });
    let eu = store.edge_uses.insert(EdgeUse {
        edge,
        vertex: v1,
        mate: EdgeUseId::default(),
        radial: EdgeUseId::default(),
        next: EdgeUseId::default(),
        prev: EdgeUseId::default(),
        parent,
        geom,
    });
    let mate = store.edge_uses.insert(EdgeUse {
        edge,
        vertex: v2,
        mate: eu,
        radial: eu,
        next: EdgeUseId::default(),
        prev: EdgeUseId::default(),
        parent: mate_parent,
        geom,
    });
    store.edge_uses[eu].mate = mate;
    store.edge_uses[eu].radial = mate;
    store.edges[edge].edge_use = eu;
    (eu, mate)
}

/// Build a loop-use on `fu` running through `vertices` in order, plus the
/// reversed mate loop-use on `fu`'s mate.
fn attach_loop(store: &mut TopoStore, fu: FaceUseId, vertices: &[VertexId]) -> Result<LoopUseId, MeshError> {
    let (fu, fu_mate, orientation, mate_orientation) = face_use_pair(store, fu)?;
    let points = boundary_points(store, vertices)?;

    let lp = store.loops.insert(Loop {
        loop_use: LoopUseId::default(),
    });
    let lu = store.loop_uses.insert(LoopUse {
        lp,
        mate: LoopUseId::default(),
        face_use: fu,
        orientation,
        kind: LoopKind::Vertex(vertices[0]),
    });
    let lu_mate = store.loop_uses.insert(LoopUse {
        lp,
        mate: lu,
        face_use: fu_mate,
        orientation: mate_orientation,
        kind: LoopKind::Vertex(vertices[0]),
    });
    store.loop_uses[lu].mate = lu_mate;
    store.loops[lp].loop_use = lu;

    let n = vertices.len();
    let mut uses = Vec::with_capacity(n);
    let mut mates = Vec::with_capacity(n);
    for i in 0..n {
        let j = (i + 1) % n;
        let (eu, mate) = make_edge(
            store,
            vertices[i],
            vertices[j],
            points[i],
            points[j],
            EdgeUseParent::Loop(lu),
            EdgeUseParent::Loop(lu_mate),
        );
        uses.push(eu);
        mates.push(mate);
    }

    // The mate loop runs the same edges backwards.
    for i in 0..n {
        let next = (i + 1) % n;
        let prev = (i + n - 1) % n;
        let eu = &mut store.edge_uses[uses[i]];
        eu.next = uses[next];
        eu.prev = uses[prev];
        let mate = &mut store.edge_uses[mates[i]];
        mate.next = mates[prev];
        mate.prev = mates[next];
    }

    store.loop_uses[lu].kind = LoopKind::Edges { first: uses[0] };
    store.loop_uses[lu_mate].kind = LoopKind::Edges { first: mates[0] };
    store.face_uses[fu].loops.push(lu);
    store.face_uses[fu_mate].loops.push(lu_mate);
    Ok(lu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(store: &mut TopoStore) -> (ShellId, Vec<VertexId>) {
        let s = make_shell(store);
        let vs = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]
            .iter()
            .map(|&(x, y)| add_vertex(store, Point3d::new(x, y, 0.0)))
            .collect();
        (s, vs)
    }

    #[test]
    fn test_make_face_links_loops() {
        let mut store = TopoStore::new();
        let (s, vs) = square(&mut store);
        let fu = make_face(&mut store, s, &vs).unwrap();

        assert_eq!(store.faces.len(), 1);
        assert_eq!(store.face_uses.len(), 2);
        assert_eq!(store.edges.len(), 4);
        assert_eq!(store.edge_uses.len(), 8);
        assert_eq!(store.shells[s].face_uses.len(), 2);

        let eus = store.face_use_edge_uses(fu, 100).unwrap();
        assert_eq!(eus.len(), 4);
        for (i, &eu) in eus.iter().enumerate() {
            let (from, to) = store.endpoints(eu).unwrap();
            assert_eq!(from, vs[i]);
            assert_eq!(to, vs[(i + 1) % 4]);
            assert_eq!(store.edge_uses[store.edge_uses[eu].next].prev, eu);
        }

        // The mate loop visits the same edges in reverse.
        let mate_fu = store.face_uses[fu].mate;
        let mate_eus = store.face_use_edge_uses(mate_fu, 100).unwrap();
        assert_eq!(mate_eus.len(), 4);
        for &m in &mate_eus {
            let (from, to) = store.endpoints(m).unwrap();
            let next = store.edge_uses[m].next;
            assert_eq!(store.endpoints(next).unwrap().0, to);
            assert_ne!(from, to);
        }
    }

    #[test]
    fn test_make_face_rejects_degenerate_boundary() {
        let mut store = TopoStore::new();
        let (s, vs) = square(&mut store);
        let err = make_face(&mut store, s, &vs[..2]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::PreconditionViolated(Precondition::DegenerateBoundary { .. })
        ));
        let err = make_face(&mut store, s, &[vs[0], vs[1], vs[1], vs[2]]).unwrap_err();
        assert!(err.is_precondition());
        assert!(store.faces.is_empty());
    }

    #[test]
    fn test_hole_runs_clockwise() {
        let mut store = TopoStore::new();
        let (s, vs) = square(&mut store);
        let fu = make_face(&mut store, s, &vs).unwrap();
        let h: Vec<_> = [(1.0, 1.0), (3.0, 1.0), (2.0, 3.0)]
            .iter()
            .map(|&(x, y)| add_vertex(&mut store, Point3d::new(x, y, 0.0)))
            .collect();

        // Given counter-clockwise, stored clockwise.
        let lu = add_hole(&mut store, fu, &h).unwrap();
        let eus = store.loop_edge_uses(lu, 100).unwrap();
        let pts: Vec<_> = eus
            .iter()
            .map(|&eu| store.vertices[store.edge_uses[eu].vertex].point)
            .collect();
        let normal = Plane::from_polygon(&pts).unwrap().normal;
        assert!(normal.z < 0.0);
        assert_eq!(store.face_uses[fu].loops.len(), 2);
    }

    #[test]
    fn test_vertex_loop_has_no_edge_uses() {
        let mut store = TopoStore::new();
        let (s, vs) = square(&mut store);
        let fu = make_face(&mut store, s, &vs).unwrap();
        let lone = add_vertex(&mut store, Point3d::new(2.0, 2.0, 0.0));
        let lu = add_vertex_loop(&mut store, fu, lone).unwrap();
        assert!(store.loop_edge_uses(lu, 100).unwrap().is_empty());
        assert_eq!(store.face_use_edge_uses(fu, 100).unwrap().len(), 4);
    }

    #[test]
    fn test_wire_edge() {
        let mut store = TopoStore::new();
        let (s, vs) = square(&mut store);
        let eu = make_wire_edge(&mut store, s, vs[0], vs[2]).unwrap();
        let mate = store.edge_uses[eu].mate;
        assert_eq!(store.edge_uses[eu].radial, mate);
        assert_eq!(store.edge_uses[mate].radial, eu);
        assert_eq!(store.shells[s].wire_edge_uses, vec![eu]);
        assert!(make_wire_edge(&mut store, s, vs[0], vs[0]).is_err());
    }
}
