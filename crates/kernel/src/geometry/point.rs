use serde::{Deserialize, Serialize};
use std::ops::Sub;

use super::vector::Vec3;

/// Vertex position. Distances between points are what the fusing tolerance
/// is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Preferred for tolerance tests: compare against `Tolerance::dist_sq`.
    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        (*self - *other).length_squared()
    }

    /// Mean of a set of points, `None` when empty.
    pub fn centroid(points: &[Point3d]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(Vec3::ZERO, |acc, p| acc + p.to_vec3());
        let c = sum / points.len() as f64;
        Some(Self::new(c.x, c.y, c.z))
    }

    pub fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl Sub for Point3d {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point3d::new(1.0, 0.0, 0.0);
        let b = Point3d::new(4.0, 4.0, 0.0);
        assert!((a.distance_squared_to(&b) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid() {
        let pts = [
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(4.0, 0.0, 0.0),
            Point3d::new(4.0, 4.0, 2.0),
            Point3d::new(0.0, 4.0, 2.0),
        ];
        assert_eq!(Point3d::centroid(&pts), Some(Point3d::new(2.0, 2.0, 1.0)));
        assert_eq!(Point3d::centroid(&[]), None);
    }

    #[test]
    fn test_difference_is_a_vector() {
        let a = Point3d::new(3.0, 4.0, 5.0);
        let b = Point3d::new(1.0, 1.0, 1.0);
        assert_eq!(a - b, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(b - b, Vec3::ZERO);
    }
}
