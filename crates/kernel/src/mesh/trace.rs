//! Observation hooks for the meshing engine.
//!
//! A `TraceSink` receives a structured account of one meshing call: which
//! edge-uses were joined, the fan of faces around each edge, every splice and
//! every tolerance ambiguity. The engine never consults global state for this.

use tracing::{Level, trace};

use super::radial::ToleranceAmbiguity;
use crate::topology::store::{EdgeId, EdgeUseId, FaceId};

/// One member of a radial cycle as seen by a sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanEntry {
    pub edge_use: EdgeUseId,
    /// `None` for wires.
    pub face: Option<FaceId>,
    /// Angular position in the join's edge frame; `None` for wires.
    pub angle: Option<f64>,
}

pub trait TraceSink {
    /// Whether `radial_fan` should be fed. Building a fan costs one angle
    /// computation per cycle member.
    fn wants_fans(&self) -> bool {
        false
    }

    fn join_started(&mut self, _eu1: EdgeUseId, _eu2: EdgeUseId) {}

    /// The faces around an edge, in radial order.
    fn radial_fan(&mut self, _label: &'static str, _fan: &[FanEntry]) {}

    /// `member` and its mate were spliced in right after `after`.
    fn member_spliced(&mut self, _member: EdgeUseId, _after: EdgeUseId, _angle: Option<f64>) {}

    fn ambiguity(&mut self, _ambiguity: &ToleranceAmbiguity) {}

    /// All uses of `killed` now live on `kept`; `killed` is gone.
    fn edge_killed(&mut self, _kept: EdgeId, _killed: EdgeId) {}
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    fn wants_fans(&self) -> bool {
        (**self).wants_fans()
    }

    fn join_started(&mut self, eu1: EdgeUseId, eu2: EdgeUseId) {
        (**self).join_started(eu1, eu2)
    }

    fn radial_fan(&mut self, label: &'static str, fan: &[FanEntry]) {
        (**self).radial_fan(label, fan)
    }

    fn member_spliced(&mut self, member: EdgeUseId, after: EdgeUseId, angle: Option<f64>) {
        (**self).member_spliced(member, after, angle)
    }

    fn ambiguity(&mut self, ambiguity: &ToleranceAmbiguity) {
        (**self).ambiguity(ambiguity)
    }

    fn edge_killed(&mut self, kept: EdgeId, killed: EdgeId) {
        (**self).edge_killed(kept, killed)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// Forwards every event to `tracing` at TRACE level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn wants_fans(&self) -> bool {
        tracing::enabled!(Level::TRACE)
    }

    fn join_started(&mut self, eu1: EdgeUseId, eu2: EdgeUseId) {
        trace!(?eu1, ?eu2, "radial join started");
    }

    fn radial_fan(&mut self, label: &'static str, fan: &[FanEntry]) {
        for (i, entry) in fan.iter().enumerate() {
            trace!(
                label,
                position = i,
                edge_use = ?entry.edge_use,
                face = ?entry.face,
                angle_deg = entry.angle.map(f64::to_degrees),
                "radial fan"
            );
        }
    }

    fn member_spliced(&mut self, member: EdgeUseId, after: EdgeUseId, angle: Option<f64>) {
        trace!(?member, ?after, angle_deg = angle.map(f64::to_degrees), "member spliced");
    }

    fn ambiguity(&mut self, ambiguity: &ToleranceAmbiguity) {
        trace!(?ambiguity, "tolerance ambiguity");
    }

    fn edge_killed(&mut self, kept: EdgeId, killed: EdgeId) {
        trace!(?kept, ?killed, "edge killed");
    }
}
