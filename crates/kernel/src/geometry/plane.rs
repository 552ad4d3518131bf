use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::vector::Vec3;
use crate::Tolerance;

/// Face geometry: an infinite oriented plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    /// Unit normal.
    pub normal: Vec3,
}

impl Plane {
    pub fn new(origin: Point3d, normal: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            normal: normal.normalized()?,
        })
    }

    /// Best-fit plane of a closed polygon by Newell's method. The normal
    /// follows the right-hand rule over the vertex order, so a polygon listed
    /// counter-clockwise seen from outside gets an outward normal.
    pub fn from_polygon(points: &[Point3d]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let mut n = Vec3::ZERO;
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
        }
        Self::new(Point3d::centroid(points)?, n)
    }

    /// Signed distance from the plane along its normal.
    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        (*p - self.origin).dot(&self.normal)
    }

    /// Whether `other` describes the same infinite plane within `tol`.
    ///
    /// Returns `Some(false)` for the same orientation, `Some(true)` when the
    /// normals are opposed, `None` when the planes differ.
    pub fn coincidence(&self, other: &Plane, tol: &Tolerance) -> Option<bool> {
        let cosine = self.normal.dot(&other.normal);
        if !tol.is_parallel(cosine) {
            return None;
        }
        if self.distance_to_point(&other.origin).abs() >= tol.dist {
            return None;
        }
        Some(cosine < 0.0)
    }
}
