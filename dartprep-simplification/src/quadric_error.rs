//! Quadric error metrics
//!
//! A quadric is the 4x4 matrix `p p^T` of a plane `p = (a, b, c, d)`; the
//! squared distance of a point to every plane summed into `Q` is `v^T Q v`
//! with `v = (x, y, z, 1)`.

use dartprep_core::Point3f;
use nalgebra::{Matrix4, Vector4};

/// Plane through a triangle, with a unit normal
///
/// Degenerate triangles yield the z = 0 plane direction so that they
/// contribute a finite quadric.
pub fn compute_plane(v0: &Point3f, v1: &Point3f, v2: &Point3f) -> Vector4<f64> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let n = e1.cross(&e2).normalize();
    if !n.iter().all(|x| x.is_finite()) {
        return Vector4::new(0.0, 0.0, 1.0, -(v0.z as f64));
    }
    let d = -n.dot(&v0.coords);
    Vector4::new(n.x as f64, n.y as f64, n.z as f64, d as f64)
}

#[rustfmt::skip]
pub fn plane_to_quadric(p: &Vector4<f64>) -> Matrix4<f64> {
    let (a, b, c, d) = (p[0], p[1], p[2], p[3]);
    Matrix4::new(
        a * a, a * b, a * c, a * d,
        a * b, b * b, b * c, b * d,
        a * c, b * c, c * c, c * d,
        a * d, b * d, c * d, d * d,
    )
}

/// Summed squared plane distance of `pos` under quadric `q`, clamped at zero
pub fn quadric_error_at(pos: &Point3f, q: &Matrix4<f64>) -> f64 {
    let v = Vector4::new(pos.x as f64, pos.y as f64, pos.z as f64, 1.0);
    (v.transpose() * q * v)[0].max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_of_xy_triangle() {
        let p = compute_plane(
            &Point3f::new(0.0, 0.0, 2.0),
            &Point3f::new(1.0, 0.0, 2.0),
            &Point3f::new(0.0, 1.0, 2.0),
        );
        assert_relative_eq!(p, Vector4::new(0.0, 0.0, 1.0, -2.0), epsilon = 1e-9);
    }

    #[test]
    fn test_quadric_error_is_squared_distance() {
        let p = Vector4::new(0.0, 0.0, 1.0, -2.0);
        let q = plane_to_quadric(&p);
        assert_relative_eq!(quadric_error_at(&Point3f::new(5.0, -3.0, 2.0), &q), 0.0);
        assert_relative_eq!(quadric_error_at(&Point3f::new(0.0, 0.0, 5.0), &q), 9.0, epsilon = 1e-9);
    }
}
