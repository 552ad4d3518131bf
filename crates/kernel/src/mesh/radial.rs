//! The radial-join engine: merges two edges that share a vertex pair into one
//! edge whose radial cycle stays sorted by face angle.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::Mesher;
use super::geom::{SharedPlane, pick_best_edge_geometry, share_face_geometry};
use super::trace::{FanEntry, TraceSink};
use super::wedge::{EdgeFrame, WedgeResult, angle_in_wedge, angular_distance, ANGLE_EPSILON, face_angle};
use crate::error::{InvariantViolation, MeshError, Precondition};
use crate::topology::store::{EdgeId, EdgeLineId, EdgeUse, EdgeUseId, Face, FaceId, PlaneId, TopoStore};
use crate::validation::monotone::verify_radial_monotone;

/// Two faces that landed on the same angle around an edge without sharing
/// plane geometry. Recoverable: the candidate is still placed next to the
/// face it tied with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceAmbiguity {
    pub edge: EdgeId,
    pub candidate: EdgeUseId,
    pub tied_with: EdgeUseId,
    pub candidate_face: FaceId,
    pub tied_face: FaceId,
    /// Angle of the tie, radians in the join's edge frame.
    pub angle: f64,
    /// Whether the two face geometries were fused.
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// Both edge-uses were already on one edge; nothing changed.
    AlreadyShared,
    Joined {
        /// The surviving edge (the target edge-use's).
        edge: EdgeId,
        /// The source edge, now removed from the store.
        killed: EdgeId,
        /// Edge-use pairs moved onto `edge`.
        spliced: usize,
        ambiguities: Vec<ToleranceAmbiguity>,
    },
}

impl JoinOutcome {
    pub fn merged(&self) -> bool {
        matches!(self, JoinOutcome::Joined { .. })
    }

    pub fn ambiguities(&self) -> &[ToleranceAmbiguity] {
        match self {
            JoinOutcome::AlreadyShared => &[],
            JoinOutcome::Joined { ambiguities, .. } => ambiguities,
        }
    }
}

/// Where a candidate goes in the target cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    /// Between `after` and its radial neighbour.
    After(EdgeUseId),
    /// Angle equals that of `tied_with`; `after` is the member to splice
    /// behind so the candidate ends up next to it.
    Tie { after: EdgeUseId, tied_with: EdgeUseId },
}

impl<S: TraceSink> Mesher<S> {
    /// Merge `eu2`'s edge into `eu1`'s edge.
    ///
    /// Every use pair on `eu2`'s radial cycle is spliced into `eu1`'s cycle at
    /// the slot matching its face angle, measured about `eu1`'s direction.
    /// Once all are in, every use shares the best-fitting edge line and the
    /// source edge is removed.
    #[instrument(skip(self, store))]
    pub fn radial_join(
        &mut self,
        store: &mut TopoStore,
        eu1: EdgeUseId,
        eu2: EdgeUseId,
    ) -> Result<JoinOutcome, MeshError> {
        let limit = self.config.max_iterations;
        let tol = self.config.tolerance;

        let edge = store.edge_use(eu1)?.edge;
        let killed = store.edge_use(eu2)?.edge;
        if !store.edge_uses_adjacent(eu1, eu2)? {
            return Err(Precondition::NotAdjacent { eu1, eu2 }.into());
        }
        let frame = EdgeFrame::from_edge_use(store, eu1, &tol)?;
        if edge == killed {
            return Ok(JoinOutcome::AlreadyShared);
        }

        self.sink.join_started(eu1, eu2);
        let best_geom = pick_best_edge_geometry(store, eu1, eu2)?;

        let target = store.radial_cycle(eu1, limit)?;
        let source = store.radial_cycle(eu2, limit)?;
        if self.sink.wants_fans() {
            let fan = radial_fan(store, &target, &frame, limit)?;
            self.sink.radial_fan("target", &fan);
            let fan = radial_fan(store, &source, &frame, limit)?;
            self.sink.radial_fan("source", &fan);
        }

        let mut journal = JoinJournal::capture(store, &[&target, &source])?;
        let merge = match self.merge_cycles(store, eu1, &source, best_geom, &frame, &mut journal) {
            Ok(merge) => merge,
            Err(err) => {
                journal.restore(store);
                debug!(?edge, ?killed, %err, "radial join failed, store restored");
                return Err(err);
            }
        };

        store.edges.remove(killed);
        journal.commit(store, &merge.stale_lines);
        self.sink.edge_killed(edge, killed);

        debug!(
            ?edge,
            ?killed,
            spliced = merge.spliced,
            cycle_len = merge.cycle_len,
            ambiguities = merge.ambiguities.len(),
            "radial join merged edges"
        );
        Ok(JoinOutcome::Joined {
            edge,
            killed,
            spliced: merge.spliced,
            ambiguities: merge.ambiguities,
        })
    }

    /// Every step of a join that can fail. Removals are left to the caller so
    /// that an error here can be undone from `journal`.
    fn merge_cycles(
        &mut self,
        store: &mut TopoStore,
        eu1: EdgeUseId,
        source: &[EdgeUseId],
        best_geom: Option<EdgeLineId>,
        frame: &EdgeFrame,
        journal: &mut JoinJournal,
    ) -> Result<Merge, MeshError> {
        let limit = self.config.max_iterations;
        let edge = store.edge_use(eu1)?.edge;

        // One member per use pair: the mate of each even position is the
        // odd position before it (or the last one, for position 0).
        let members: Vec<EdgeUseId> = source.iter().copied().step_by(2).collect();
        let mut ambiguities = Vec::new();
        for &member in &members {
            ambiguities.extend(self.place_member(store, eu1, member, edge, frame, journal)?);
        }

        let unified = store.radial_cycle(eu1, limit)?;
        let stale_lines = unify_edge_geometry(store, &unified, best_geom)?;

        if self.sink.wants_fans() {
            let fan = radial_fan(store, &unified, frame, limit)?;
            self.sink.radial_fan("merged", &fan);
        }
        if self.config.verify_monotone {
            verify_radial_monotone(store, edge, &self.config.tolerance, limit)?;
        }
        Ok(Merge {
            spliced: members.len(),
            cycle_len: unified.len(),
            ambiguities,
            stale_lines,
        })
    }

    /// Find the slot for one source member and splice it in, resolving an
    /// angle tie first if there is one. Returns the tie, if any.
    fn place_member(
        &mut self,
        store: &mut TopoStore,
        eu1: EdgeUseId,
        member: EdgeUseId,
        edge: EdgeId,
        frame: &EdgeFrame,
        journal: &mut JoinJournal,
    ) -> Result<Option<ToleranceAmbiguity>, MeshError> {
        let limit = self.config.max_iterations;
        let tol = self.config.tolerance;

        let mut tie = None;
        let slot = find_slot(store, eu1, member, edge, frame, limit)?;
        let after = match slot {
            Slot::After(after) => after,
            Slot::Tie { after, tied_with } => {
                // Ties only arise for faced candidates against faced members.
                let (Some(candidate_face), Some(tied_face)) = (store.face_of(member)?, store.face_of(tied_with)?)
                else {
                    return Err(InvariantViolation::NoInsertionSlot { edge, candidate: member }.into());
                };
                if shares_geometry(store, candidate_face, tied_face)? {
                    after
                } else {
                    let angle = face_angle(store, member, frame, limit)?.unwrap_or_default();
                    let mut resolved = false;
                    let mut placed = after;
                    if self.config.fuse_ambiguous_faces
                        && let Some(shared) = share_face_geometry(store, tied_face, candidate_face, &tol)?
                    {
                        journal.record(shared);
                        resolved = true;
                        // Fusing moves the candidate's normal; look again.
                        match find_slot(store, eu1, member, edge, frame, limit)? {
                            Slot::After(a) => placed = a,
                            Slot::Tie { after: a, tied_with: t } => {
                                if let Some(f) = store.face_of(t)?
                                    && shares_geometry(store, candidate_face, f)?
                                {
                                    placed = a;
                                }
                            }
                        }
                    }
                    let ambiguity = ToleranceAmbiguity {
                        edge,
                        candidate: member,
                        tied_with,
                        candidate_face,
                        tied_face,
                        angle,
                        resolved,
                    };
                    warn!(
                        ?edge,
                        candidate = ?member,
                        ?tied_with,
                        angle_deg = angle.to_degrees(),
                        resolved,
                        "faces tie in angle around edge"
                    );
                    self.sink.ambiguity(&ambiguity);
                    tie = Some(ambiguity);
                    placed
                }
            }
        };

        splice_after(store, after, member, edge)?;
        let angle = face_angle(store, member, frame, limit)?;
        self.sink.member_spliced(member, after, angle);
        Ok(tie)
    }
}

/// What a successful `merge_cycles` leaves for the caller to commit.
struct Merge {
    spliced: usize,
    cycle_len: usize,
    ambiguities: Vec<ToleranceAmbiguity>,
    stale_lines: Vec<EdgeLineId>,
}

/// Records a join may overwrite, as they were before it started.
///
/// Removals wait for `commit`, so every key stays valid and `restore` can
/// put the store back exactly.
struct JoinJournal {
    edge_uses: Vec<(EdgeUseId, EdgeUse)>,
    faces: Vec<(FaceId, Face)>,
    orphan_planes: Vec<PlaneId>,
}

impl JoinJournal {
    /// Splices and geometry unification only touch uses on these cycles.
    fn capture(store: &TopoStore, cycles: &[&[EdgeUseId]]) -> Result<Self, MeshError> {
        let mut edge_uses = Vec::new();
        for &eu in cycles.iter().flat_map(|cycle| cycle.iter()) {
            edge_uses.push((eu, *store.edge_use(eu)?));
        }
        Ok(Self {
            edge_uses,
            faces: Vec::new(),
            orphan_planes: Vec::new(),
        })
    }

    fn record(&mut self, shared: SharedPlane) {
        self.faces.extend(shared.previous);
        self.orphan_planes.extend(shared.orphan);
    }

    fn restore(self, store: &mut TopoStore) {
        for (id, eu) in self.edge_uses {
            if let Some(slot) = store.edge_uses.get_mut(id) {
                *slot = eu;
            }
        }
        // Newest first, so a face moved twice ends on its original plane.
        for (id, face) in self.faces.into_iter().rev() {
            if let Some(slot) = store.faces.get_mut(id) {
                *slot = face;
            }
        }
    }

    /// Drop the planes fused away and whichever of `lines` nothing uses now.
    fn commit(self, store: &mut TopoStore, lines: &[EdgeLineId]) {
        for plane in self.orphan_planes {
            store.planes.remove(plane);
        }
        for &line in lines {
            if !store.edge_uses.values().any(|e| e.geom == Some(line)) {
                store.edge_lines.remove(line);
            }
        }
    }
}

fn shares_geometry(store: &TopoStore, a: FaceId, b: FaceId) -> Result<bool, MeshError> {
    Ok(store.face(a)?.geom == store.face(b)?.geom)
}

/// Search `eu1`'s current cycle for the wedge holding `candidate`'s face.
///
/// Wedges open at even positions (uses running along `eu1`), between a use
/// and its radial neighbour. Wires carry no angle, so a wedge boundary that
/// lands on a wire is pushed out to the nearest faced member on that side.
fn find_slot(
    store: &TopoStore,
    eu1: EdgeUseId,
    candidate: EdgeUseId,
    edge: EdgeId,
    frame: &EdgeFrame,
    limit: usize,
) -> Result<Slot, MeshError> {
    let Some(t) = face_angle(store, candidate, frame, limit)? else {
        return Ok(Slot::After(eu1));
    };

    let cycle = store.radial_cycle(eu1, limit)?;
    let angles = cycle
        .iter()
        .map(|&eu| face_angle(store, eu, frame, limit))
        .collect::<Result<Vec<_>, _>>()?;

    let faced: Vec<usize> = (0..cycle.len()).filter(|&i| angles[i].is_some()).collect();
    let Some(&first) = faced.first() else {
        return Ok(Slot::After(eu1));
    };
    let a0 = angles[first].unwrap_or_default();
    let single_angle = faced
        .iter()
        .all(|&i| angles[i].is_some_and(|a| angular_distance(a, a0) < ANGLE_EPSILON));
    if single_angle {
        if angular_distance(a0, t) < ANGLE_EPSILON {
            return Ok(Slot::Tie {
                after: eu1,
                tied_with: cycle[first],
            });
        }
        return Ok(Slot::After(eu1));
    }

    let n = cycle.len();
    let nearest_faced = |start: usize, forward: bool| -> Option<usize> {
        (0..n)
            .map(|k| if forward { (start + k) % n } else { (start + n - k) % n })
            .find(|&i| angles[i].is_some())
    };
    for i in (0..n).step_by(2) {
        let (Some(lo), Some(hi)) = (nearest_faced(i, false), nearest_faced((i + 1) % n, true)) else {
            continue;
        };
        let (Some(a), Some(b)) = (angles[lo], angles[hi]) else {
            continue;
        };
        match angle_in_wedge(a, b, t) {
            WedgeResult::Inside => return Ok(Slot::After(cycle[i])),
            WedgeResult::EqualsA => {
                return Ok(Slot::Tie {
                    after: cycle[i],
                    tied_with: cycle[lo],
                });
            }
            WedgeResult::EqualsB => {
                return Ok(Slot::Tie {
                    after: cycle[i],
                    tied_with: cycle[hi],
                });
            }
            WedgeResult::Outside => {}
        }
    }
    Err(InvariantViolation::NoInsertionSlot { edge, candidate }.into())
}

/// Splice `member` and its mate into the cycle between `at` and its radial
/// neighbour, and move both onto `edge`. The one of the pair that runs
/// against `at` becomes `at`'s new radial.
fn splice_after(store: &mut TopoStore, at: EdgeUseId, member: EdgeUseId, edge: EdgeId) -> Result<(), MeshError> {
    let r = store.edge_use(at)?.radial;
    store.hop(at, r)?;
    let (_, at_end) = store.endpoints(at)?;
    let member_use = *store.edge_use(member)?;
    store.hop(member, member_use.mate)?;

    let (x, y) = if member_use.vertex == at_end {
        (member, member_use.mate)
    } else {
        (member_use.mate, member)
    };

    store.edge_use_mut(at)?.radial = x;
    let xu = store.edge_use_mut(x)?;
    xu.radial = at;
    xu.edge = edge;
    let yu = store.edge_use_mut(y)?;
    yu.radial = r;
    yu.edge = edge;
    store.edge_use_mut(r)?.radial = y;
    Ok(())
}

/// Point every use of the merged cycle at `best`. Returns the lines it
/// replaced, which may now be unreferenced.
fn unify_edge_geometry(
    store: &mut TopoStore,
    cycle: &[EdgeUseId],
    best: Option<EdgeLineId>,
) -> Result<Vec<EdgeLineId>, MeshError> {
    let mut replaced: Vec<EdgeLineId> = Vec::new();
    for &eu in cycle {
        let e = store.edge_use_mut(eu)?;
        if let Some(old) = e.geom
            && Some(old) != best
            && !replaced.contains(&old)
        {
            replaced.push(old);
        }
        e.geom = best;
    }
    Ok(replaced)
}

fn radial_fan(
    store: &TopoStore,
    cycle: &[EdgeUseId],
    frame: &EdgeFrame,
    limit: usize,
) -> Result<Vec<FanEntry>, MeshError> {
    cycle
        .iter()
        .map(|&eu| {
            Ok(FanEntry {
                edge_use: eu,
                face: store.face_of(eu)?,
                angle: face_angle(store, eu, frame, limit)?,
            })
        })
        .collect()
}
