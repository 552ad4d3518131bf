use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::error::{InvariantViolation, MeshError, Precondition};
use crate::geometry::line::EdgeLine;
use crate::geometry::plane::Plane;
use crate::geometry::point::Point3d;
use crate::geometry::vector::Vec3;

// ─── Entity Keys ─────────────────────────────────────────────────────────────

new_key_type! {
    pub struct VertexId;
    pub struct EdgeId;
    pub struct EdgeUseId;
    pub struct LoopId;
    pub struct LoopUseId;
    pub struct FaceId;
    pub struct FaceUseId;
    pub struct ShellId;
    pub struct PlaneId;
    pub struct EdgeLineId;
}

// ─── Topological Entities ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub point: Point3d,
}

/// An undirected edge. All of its uses sit on one radial cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Any edge-use on the edge's radial cycle.
    pub edge_use: EdgeUseId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeUseParent {
    Loop(LoopUseId),
    /// Faceless edge-use hanging directly off a shell.
    Wire(ShellId),
}

/// A directed use of an edge.
///
/// `mate` runs the same edge in the opposite direction; `radial` is the
/// neighbouring use across the space between two faces. Both relations are
/// symmetric, and walking radial, mate, radial, mate ... visits every use of
/// the edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EdgeUse {
    pub edge: EdgeId,
    /// Start vertex. The end vertex is the mate's start vertex.
    pub vertex: VertexId,
    pub mate: EdgeUseId,
    pub radial: EdgeUseId,
    pub next: EdgeUseId,
    pub prev: EdgeUseId,
    pub parent: EdgeUseParent,
    pub geom: Option<EdgeLineId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Normal agrees with the face geometry (after `Face::flip`).
    Same,
    Opposite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loop {
    pub loop_use: LoopUseId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopKind {
    Edges { first: EdgeUseId },
    /// Self-loop on a single vertex; carries no edge-uses.
    Vertex(VertexId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopUse {
    pub lp: LoopId,
    pub mate: LoopUseId,
    pub face_use: FaceUseId,
    pub orientation: Orientation,
    pub kind: LoopKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub geom: PlaneId,
    /// true if the face normal is the reverse of its plane's normal.
    pub flip: bool,
    pub face_use: FaceUseId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceUse {
    pub face: FaceId,
    pub mate: FaceUseId,
    pub orientation: Orientation,
    pub shell: ShellId,
    pub loops: Vec<LoopUseId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shell {
    pub face_uses: Vec<FaceUseId>,
    pub wire_edge_uses: Vec<EdgeUseId>,
}

// ─── Entity Store ────────────────────────────────────────────────────────────

/// Arena-based storage for all topological entities of one Boolean
/// operation. Relations are plain keys into the arenas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopoStore {
    pub vertices: SlotMap<VertexId, Vertex>,
    pub edges: SlotMap<EdgeId, Edge>,
    pub edge_uses: SlotMap<EdgeUseId, EdgeUse>,
    pub loops: SlotMap<LoopId, Loop>,
    pub loop_uses: SlotMap<LoopUseId, LoopUse>,
    pub faces: SlotMap<FaceId, Face>,
    pub face_uses: SlotMap<FaceUseId, FaceUse>,
    pub shells: SlotMap<ShellId, Shell>,
    pub planes: SlotMap<PlaneId, Plane>,
    pub edge_lines: SlotMap<EdgeLineId, EdgeLine>,
}

fn stale<K: std::fmt::Debug>(kind: &'static str, key: K) -> MeshError {
    Precondition::StaleHandle {
        kind,
        handle: format!("{key:?}"),
    }
    .into()
}

fn dangling<K: std::fmt::Debug, F: std::fmt::Debug>(kind: &'static str, key: K, from: F) -> MeshError {
    InvariantViolation::DanglingReference {
        kind,
        handle: format!("{key:?}"),
        from: format!("{from:?}"),
    }
    .into()
}

impl TopoStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Checked access ───────────────────────────────────────────────────

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, MeshError> {
        self.vertices.get(id).ok_or_else(|| stale("vertex", id))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, MeshError> {
        self.edges.get(id).ok_or_else(|| stale("edge", id))
    }

    pub fn edge_use(&self, id: EdgeUseId) -> Result<&EdgeUse, MeshError> {
        self.edge_uses.get(id).ok_or_else(|| stale("edge-use", id))
    }

    pub fn loop_use(&self, id: LoopUseId) -> Result<&LoopUse, MeshError> {
        self.loop_uses.get(id).ok_or_else(|| stale("loop-use", id))
    }

    pub fn face(&self, id: FaceId) -> Result<&Face, MeshError> {
        self.faces.get(id).ok_or_else(|| stale("face", id))
    }

    pub fn face_use(&self, id: FaceUseId) -> Result<&FaceUse, MeshError> {
        self.face_uses.get(id).ok_or_else(|| stale("face-use", id))
    }

    pub fn shell(&self, id: ShellId) -> Result<&Shell, MeshError> {
        self.shells.get(id).ok_or_else(|| stale("shell", id))
    }

    pub fn plane(&self, id: PlaneId) -> Result<&Plane, MeshError> {
        self.planes.get(id).ok_or_else(|| stale("plane", id))
    }

    pub fn edge_line(&self, id: EdgeLineId) -> Result<&EdgeLine, MeshError> {
        self.edge_lines.get(id).ok_or_else(|| stale("edge line", id))
    }

    pub(crate) fn edge_use_mut(&mut self, id: EdgeUseId) -> Result<&mut EdgeUse, MeshError> {
        self.edge_uses.get_mut(id).ok_or_else(|| stale("edge-use", id))
    }

    /// Follow a relation stored on `from`. A missing target is corruption,
    /// not a caller mistake.
    pub fn hop(&self, from: EdgeUseId, to: EdgeUseId) -> Result<&EdgeUse, MeshError> {
        self.edge_uses.get(to).ok_or_else(|| dangling("edge-use", to, from))
    }

    // ── Edge-use queries ─────────────────────────────────────────────────

    /// `(start, end)` vertices of an edge-use.
    pub fn endpoints(&self, eu: EdgeUseId) -> Result<(VertexId, VertexId), MeshError> {
        let e = self.edge_use(eu)?;
        let mate = self.hop(eu, e.mate)?;
        Ok((e.vertex, mate.vertex))
    }

    /// Unit direction from start to end vertex, `None` for coincident ends.
    pub fn direction(&self, eu: EdgeUseId) -> Result<Option<Vec3>, MeshError> {
        let (from, to) = self.endpoints(eu)?;
        let a = self.vertex(from)?.point;
        let b = self.vertex(to)?.point;
        Ok((b - a).normalized())
    }

    /// True when both edge-uses join the same unordered pair of vertices.
    pub fn edge_uses_adjacent(&self, eu1: EdgeUseId, eu2: EdgeUseId) -> Result<bool, MeshError> {
        let (a1, b1) = self.endpoints(eu1)?;
        let (a2, b2) = self.endpoints(eu2)?;
        Ok((a1 == a2 && b1 == b2) || (a1 == b2 && b1 == a2))
    }

    /// Face-use owning the edge-use, `None` for wires.
    pub fn face_use_of(&self, eu: EdgeUseId) -> Result<Option<FaceUseId>, MeshError> {
        match self.edge_use(eu)?.parent {
            EdgeUseParent::Loop(lu) => {
                let lu = self
                    .loop_uses
                    .get(lu)
                    .ok_or_else(|| dangling("loop-use", lu, eu))?;
                Ok(Some(lu.face_use))
            }
            EdgeUseParent::Wire(_) => Ok(None),
        }
    }

    /// Face owning the edge-use, `None` for wires.
    pub fn face_of(&self, eu: EdgeUseId) -> Result<Option<FaceId>, MeshError> {
        match self.face_use_of(eu)? {
            Some(fu) => Ok(Some(self.face_use(fu)?.face)),
            None => Ok(None),
        }
    }

    /// Outward normal of a face-use: the plane normal, reversed once for a
    /// flipped face and once more for the opposite use.
    pub fn face_use_normal(&self, fu: FaceUseId) -> Result<Vec3, MeshError> {
        let face_use = self.face_use(fu)?;
        let face = self.face(face_use.face)?;
        let normal = self.plane(face.geom)?.normal;
        let reversed = face.flip != (face_use.orientation == Orientation::Opposite);
        Ok(if reversed { -normal } else { normal })
    }

    // ── Bounded traversals ───────────────────────────────────────────────

    /// The radial cycle through `start`, in radial order:
    /// `start, start.radial, start.radial.mate, ...`.
    ///
    /// Even positions run in `start`'s direction, odd positions against it.
    pub fn radial_cycle(&self, start: EdgeUseId, limit: usize) -> Result<Vec<EdgeUseId>, MeshError> {
        self.edge_use(start)?;
        let mut cycle = vec![start];
        let mut current = start;
        for _ in 0..limit {
            let radial = self.edge_use(current)?.radial;
            if radial == start {
                return Err(InvariantViolation::OddRadialCycle { start }.into());
            }
            let mate = self.hop(current, radial)?.mate;
            cycle.push(radial);
            self.hop(radial, mate)?;
            if mate == start {
                return Ok(cycle);
            }
            cycle.push(mate);
            current = mate;
        }
        Err(InvariantViolation::IterationLimit { start, limit }.into())
    }

    /// Edge-uses of one loop-use in `next` order; empty for a self-loop.
    pub fn loop_edge_uses(&self, lu: LoopUseId, limit: usize) -> Result<Vec<EdgeUseId>, MeshError> {
        let first = match self.loop_use(lu)?.kind {
            LoopKind::Edges { first } => first,
            LoopKind::Vertex(_) => return Ok(Vec::new()),
        };
        self.edge_use(first)?;
        let mut out = vec![first];
        let mut current = first;
        for _ in 0..limit {
            let next = self.edge_use(current)?.next;
            self.hop(current, next)?;
            if next == first {
                return Ok(out);
            }
            out.push(next);
            current = next;
        }
        Err(InvariantViolation::IterationLimit { start: first, limit }.into())
    }

    /// Edge-uses of every non-self loop of a face-use.
    pub fn face_use_edge_uses(&self, fu: FaceUseId, limit: usize) -> Result<Vec<EdgeUseId>, MeshError> {
        let mut out = Vec::new();
        for &lu in &self.face_use(fu)?.loops {
            out.extend(self.loop_edge_uses(lu, limit)?);
        }
        Ok(out)
    }

    /// All edge-uses referencing `edge`, by arena scan.
    pub fn edge_uses_on_edge(&self, edge: EdgeId) -> Vec<EdgeUseId> {
        self.edge_uses
            .iter()
            .filter(|(_, eu)| eu.edge == edge)
            .map(|(id, _)| id)
            .collect()
    }

    /// Face-uses of a shell with `Same` orientation.
    pub fn shell_same_face_uses(&self, shell: ShellId) -> Result<Vec<FaceUseId>, MeshError> {
        let mut out = Vec::new();
        for &fu in &self.shell(shell)?.face_uses {
            if self.face_use(fu)?.orientation == Orientation::Same {
                out.push(fu);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::build::{add_vertex, make_face, make_shell, make_wire_edge};

    fn triangle(store: &mut TopoStore) -> FaceUseId {
        let s = make_shell(store);
        let a = add_vertex(store, Point3d::new(0.0, 0.0, 0.0));
        let b = add_vertex(store, Point3d::new(1.0, 0.0, 0.0));
        let c = add_vertex(store, Point3d::new(0.0, 1.0, 0.0));
        make_face(store, s, &[a, b, c]).unwrap()
    }

    #[test]
    fn test_entity_store_creation() {
        let store = TopoStore::new();
        assert_eq!(store.vertices.len(), 0);
        assert_eq!(store.edge_uses.len(), 0);
    }

    #[test]
    fn test_single_face_radial_cycle_is_mate_pair() {
        let mut store = TopoStore::new();
        let fu = triangle(&mut store);
        for eu in store.face_use_edge_uses(fu, 100).unwrap() {
            let cycle = store.radial_cycle(eu, 100).unwrap();
            assert_eq!(cycle.len(), 2);
            assert_eq!(cycle[1], store.edge_uses[eu].mate);
        }
    }

    #[test]
    fn test_face_use_normals_are_opposed() {
        let mut store = TopoStore::new();
        let fu = triangle(&mut store);
        let mate = store.face_uses[fu].mate;
        assert_eq!(store.face_use_normal(fu).unwrap(), Vec3::Z);
        assert_eq!(store.face_use_normal(mate).unwrap(), -Vec3::Z);
    }

    #[test]
    fn test_adjacency_is_unordered() {
        let mut store = TopoStore::new();
        let s = make_shell(&mut store);
        let a = add_vertex(&mut store, Point3d::ORIGIN);
        let b = add_vertex(&mut store, Point3d::new(1.0, 0.0, 0.0));
        let c = add_vertex(&mut store, Point3d::new(2.0, 0.0, 0.0));
        let ab = make_wire_edge(&mut store, s, a, b).unwrap();
        let ba = make_wire_edge(&mut store, s, b, a).unwrap();
        let bc = make_wire_edge(&mut store, s, b, c).unwrap();
        assert!(store.edge_uses_adjacent(ab, ba).unwrap());
        assert!(!store.edge_uses_adjacent(ab, bc).unwrap());
        assert_eq!(store.face_use_of(ab).unwrap(), None);
    }

    #[test]
    fn test_stale_handle_is_precondition() {
        let mut store = TopoStore::new();
        let fu = triangle(&mut store);
        let eu = store.face_use_edge_uses(fu, 100).unwrap()[0];
        store.edge_uses.remove(eu);
        let err = store.edge_use(eu).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_self_radial_is_odd_cycle() {
        let mut store = TopoStore::new();
        let fu = triangle(&mut store);
        let eu = store.face_use_edge_uses(fu, 100).unwrap()[0];
        store.edge_uses[eu].radial = eu;
        let err = store.radial_cycle(eu, 100).unwrap_err();
        assert_eq!(
            err,
            MeshError::TopologyInvariantViolated(InvariantViolation::OddRadialCycle { start: eu })
        );
    }

    #[test]
    fn test_dangling_radial_is_invariant() {
        let mut store = TopoStore::new();
        let fu = triangle(&mut store);
        let eus = store.face_use_edge_uses(fu, 100).unwrap();
        let mate = store.edge_uses[eus[0]].mate;
        store.edge_uses.remove(mate);
        let err = store.radial_cycle(eus[0], 100).unwrap_err();
        assert!(err.is_invariant());
    }
}
