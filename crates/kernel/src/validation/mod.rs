//! Checks of the radial-edge invariants, for tests and debug builds.

pub mod audit;
pub mod monotone;

pub use audit::{AuditError, TopologyAudit, audit_store};
pub use monotone::{radial_angles, verify_radial_monotone, winding_turns};
