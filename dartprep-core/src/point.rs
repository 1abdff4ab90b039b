//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Widen a single precision point for bounds and transform arithmetic.
#[inline]
pub fn to_point3d(p: &Point3f) -> Point3d {
    Point3d::new(p.x as f64, p.y as f64, p.z as f64)
}

/// Narrow a double precision point back to mesh storage precision.
#[inline]
pub fn to_point3f(p: &Point3d) -> Point3f {
    Point3f::new(p.x as f32, p.y as f32, p.z as f32)
}
