//! Arena-based radial-edge topology.
//!
//! Entities (vertex, edge, edge-use, loop, loop-use, face, face-use, shell)
//! live in a central `TopoStore` and reference each other through
//! generation-checked slotmap keys.

pub mod build;
pub mod store;

pub use store::*;
