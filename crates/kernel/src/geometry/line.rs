use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;

/// Infinite line carrying one or more edges: a sample point and a unit
/// direction. Several edge-uses may reference the same line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeLine {
    pub origin: Point3d,
    pub direction: Vec3,
}

impl EdgeLine {
    /// Line through `a` towards `b`. `None` when the points coincide.
    pub fn from_points(a: Point3d, b: Point3d) -> Option<Self> {
        let direction = (b - a).normalized()?;
        Some(Self {
            origin: a,
            direction,
        })
    }
}
