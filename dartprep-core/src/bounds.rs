//! Axis-aligned bounding boxes
//!
//! Bounds are always derived on demand from vertex positions and are kept in
//! double precision so the normalization arithmetic downstream stays exact.

use crate::point::*;
use serde::{Deserialize, Serialize};

/// Min/max corner per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    /// Create a bounding box from two corners
    pub fn new(min: Point3d, max: Point3d) -> Self {
        Self { min, max }
    }

    /// Compute the bounds of a set of points; `None` when there are no points
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3f>,
    {
        let mut iter = points.into_iter();
        let first = to_point3d(iter.next()?);
        let mut min = first;
        let mut max = first;

        for p in iter {
            let p = to_point3d(p);
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some(Self { min, max })
    }

    /// Edge lengths along x, y and z
    pub fn extents(&self) -> Vector3d {
        self.max - self.min
    }

    /// Longest edge length
    pub fn max_extent(&self) -> f64 {
        self.extents().max()
    }

    /// Midpoint of the box
    pub fn center(&self) -> Point3d {
        Point3d::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Whether a point lies inside the box grown by `tolerance` on every side
    pub fn contains(&self, p: &Point3d, tolerance: f64) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - tolerance && p[i] <= self.max[i] + tolerance)
    }

    /// Whether `other` lies entirely inside this box grown by `tolerance`
    pub fn contains_box(&self, other: &BoundingBox, tolerance: f64) -> bool {
        self.contains(&other.min, tolerance) && self.contains(&other.max, tolerance)
    }

    /// Grow the box by `margin` along x and y only
    pub fn expanded_xy(&self, margin: f64) -> Self {
        Self {
            min: Point3d::new(self.min.x - margin, self.min.y - margin, self.min.z),
            max: Point3d::new(self.max.x + margin, self.max.y + margin, self.max.z),
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}, {:.4}] .. [{:.4}, {:.4}, {:.4}]",
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_points_have_no_bounds() {
        let points: Vec<Point3f> = Vec::new();
        assert!(BoundingBox::from_points(&points).is_none());
    }

    #[test]
    fn test_bounds_of_points() {
        let points = vec![
            Point3f::new(1.0, -2.0, 0.5),
            Point3f::new(-1.0, 3.0, 2.0),
            Point3f::new(0.0, 0.0, -1.0),
        ];
        let bb = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bb.min, Point3d::new(-1.0, -2.0, -1.0));
        assert_eq!(bb.max, Point3d::new(1.0, 3.0, 2.0));
        assert_relative_eq!(bb.max_extent(), 5.0);
        assert_relative_eq!(bb.center(), Point3d::new(0.0, 0.5, 0.5));
    }

    #[test]
    fn test_expanded_xy_keeps_z() {
        let bb = BoundingBox::new(Point3d::new(-1.0, -1.0, 0.0), Point3d::new(1.0, 1.0, 2.0));
        let grown = bb.expanded_xy(0.5);
        assert_eq!(grown.min, Point3d::new(-1.5, -1.5, 0.0));
        assert_eq!(grown.max, Point3d::new(1.5, 1.5, 2.0));
        assert!(grown.contains_box(&bb, 0.0));
    }
}
