use std::collections::HashSet;

use tracing::{info, instrument};

use super::monotone::verify_radial_monotone;
use crate::Tolerance;
use crate::error::{InvariantViolation, MeshError};
use crate::topology::store::{EdgeId, EdgeUseId, TopoStore};

/// Result of auditing every edge and edge-use in a store.
#[derive(Debug, Clone, Default)]
pub struct TopologyAudit {
    pub mates_consistent: bool,
    pub radials_consistent: bool,
    pub cycles_closed: bool,
    pub cycles_complete: bool,
    pub radials_monotone: bool,
    pub errors: Vec<AuditError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuditError {
    /// Mate missing, not mutual, on another edge, or running the same way.
    MateMismatch { edge_use: EdgeUseId },
    /// Radial missing, not mutual, on another edge, or running the same way.
    RadialMismatch { edge_use: EdgeUseId },
    /// The edge's representative use is gone or belongs elsewhere.
    MissingRepresentative { edge: EdgeId },
    /// Walking the edge's radial cycle failed.
    OpenCycle { edge: EdgeId, error: MeshError },
    /// Uses that reference the edge but are not on its cycle, or the reverse.
    StrayEdgeUses { edge: EdgeId, edge_uses: Vec<EdgeUseId> },
    NonMonotone { edge: EdgeId, turns: f64 },
}

impl TopologyAudit {
    pub fn all_valid(&self) -> bool {
        self.mates_consistent
            && self.radials_consistent
            && self.cycles_closed
            && self.cycles_complete
            && self.radials_monotone
    }
}

/// Check the radial-edge invariants over the whole store.
#[instrument(skip(store, tol))]
pub fn audit_store(store: &TopoStore, tol: &Tolerance, limit: usize) -> TopologyAudit {
    let mut errors = Vec::new();

    for (id, eu) in &store.edge_uses {
        let mate_ok = store
            .edge_uses
            .get(eu.mate)
            .is_some_and(|m| m.mate == id && m.edge == eu.edge && m.vertex != eu.vertex);
        if !mate_ok {
            errors.push(AuditError::MateMismatch { edge_use: id });
        }

        // A radial neighbour starts where this use ends.
        let end = store.edge_uses.get(eu.mate).map(|m| m.vertex);
        let radial_ok = store
            .edge_uses
            .get(eu.radial)
            .is_some_and(|r| r.radial == id && r.edge == eu.edge && Some(r.vertex) == end);
        if !radial_ok {
            errors.push(AuditError::RadialMismatch { edge_use: id });
        }
    }

    for (edge_id, edge) in &store.edges {
        let start = edge.edge_use;
        if store.edge_uses.get(start).is_none_or(|eu| eu.edge != edge_id) {
            errors.push(AuditError::MissingRepresentative { edge: edge_id });
            continue;
        }
        let cycle = match store.radial_cycle(start, limit) {
            Ok(cycle) => cycle,
            Err(error) => {
                errors.push(AuditError::OpenCycle { edge: edge_id, error });
                continue;
            }
        };

        let on_cycle: HashSet<EdgeUseId> = cycle.iter().copied().collect();
        let referencing: HashSet<EdgeUseId> = store.edge_uses_on_edge(edge_id).into_iter().collect();
        let mut stray: Vec<EdgeUseId> = on_cycle.symmetric_difference(&referencing).copied().collect();
        if !stray.is_empty() {
            stray.sort();
            errors.push(AuditError::StrayEdgeUses {
                edge: edge_id,
                edge_uses: stray,
            });
            continue;
        }

        match verify_radial_monotone(store, edge_id, tol, limit) {
            Ok(()) => {}
            Err(MeshError::TopologyInvariantViolated(InvariantViolation::NonMonotoneRadial { turns, .. })) => {
                errors.push(AuditError::NonMonotone { edge: edge_id, turns });
            }
            Err(error) => errors.push(AuditError::OpenCycle { edge: edge_id, error }),
        }
    }

    let audit = TopologyAudit {
        mates_consistent: !errors.iter().any(|e| matches!(e, AuditError::MateMismatch { .. })),
        radials_consistent: !errors.iter().any(|e| matches!(e, AuditError::RadialMismatch { .. })),
        cycles_closed: !errors
            .iter()
            .any(|e| matches!(e, AuditError::OpenCycle { .. } | AuditError::MissingRepresentative { .. })),
        cycles_complete: !errors.iter().any(|e| matches!(e, AuditError::StrayEdgeUses { .. })),
        radials_monotone: !errors.iter().any(|e| matches!(e, AuditError::NonMonotone { .. })),
        errors,
    };
    info!(
        edges = store.edges.len(),
        edge_uses = store.edge_uses.len(),
        mates_consistent = audit.mates_consistent,
        radials_consistent = audit.radials_consistent,
        cycles_closed = audit.cycles_closed,
        cycles_complete = audit.cycles_complete,
        radials_monotone = audit.radials_monotone,
        error_count = audit.errors.len(),
        "radial topology audit complete"
    );
    audit
}
