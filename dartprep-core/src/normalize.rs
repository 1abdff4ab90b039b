//! Centering and uniform scaling of meshes into the SDF working cube

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::mesh::TriangleMesh;
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A center and a uniform scale factor
///
/// `normalize` maps `v` to `(v - center) * scale`; `denormalize` maps it back
/// with `v / scale + center`. With `scale = 2 * mesh_scale / max_extent` the
/// longest bounding-box axis of the source mesh spans `[-mesh_scale, mesh_scale]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationTransform {
    pub center: Point3d,
    pub scale: f64,
}

impl NormalizationTransform {
    /// Create a transform from its parts
    pub fn new(center: Point3d, scale: f64) -> Self {
        Self { center, scale }
    }

    /// Fit a transform to a bounding box
    pub fn from_bounds(bounds: &BoundingBox, mesh_scale: f64) -> Result<Self> {
        let extent = bounds.max_extent();
        if !(extent > 0.0) || !extent.is_finite() {
            return Err(Error::InvalidData(format!(
                "Cannot normalize bounds with extent {}",
                extent
            )));
        }
        if !(mesh_scale > 0.0) {
            return Err(Error::InvalidData(format!(
                "Mesh scale must be positive, got {}",
                mesh_scale
            )));
        }

        Ok(Self {
            center: bounds.center(),
            scale: 2.0 * mesh_scale / extent,
        })
    }

    /// Fit a transform to a mesh's vertices
    pub fn from_mesh(mesh: &TriangleMesh, mesh_scale: f64) -> Result<Self> {
        let bounds = mesh
            .bounding_box()
            .ok_or_else(|| Error::InvalidData("Mesh has no vertices".to_string()))?;
        Self::from_bounds(&bounds, mesh_scale)
    }

    /// Map a world-space point into normalized space
    #[inline]
    pub fn normalize_point(&self, p: &Point3d) -> Point3d {
        Point3d::from((p - self.center) * self.scale)
    }

    /// Map a normalized point back into world space
    #[inline]
    pub fn denormalize_point(&self, p: &Point3d) -> Point3d {
        Point3d::from(p.coords / self.scale + self.center.coords)
    }

    /// Normalized copies of a mesh's vertices in double precision
    pub fn normalized_vertices(&self, mesh: &TriangleMesh) -> Vec<Point3d> {
        mesh.vertices
            .iter()
            .map(|v| self.normalize_point(&to_point3d(v)))
            .collect()
    }

    /// Apply the forward transform to a mesh in place
    pub fn normalize_mesh(&self, mesh: &mut TriangleMesh) {
        mesh.transform_vertices(|v| to_point3f(&self.normalize_point(&to_point3d(v))));
    }

    /// Apply the inverse transform to a mesh in place
    pub fn denormalize_mesh(&self, mesh: &mut TriangleMesh) {
        mesh.transform_vertices(|v| to_point3f(&self.denormalize_point(&to_point3d(v))));
    }
}

/// Everything needed to map SDF grid coordinates back into scene space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SdfMetadata {
    pub center: [f64; 3],
    pub scale: f64,
    pub level: f64,
    pub size: usize,
}

impl SdfMetadata {
    /// Metadata for a grid of `size` cells per axis over `[-1, 1]`
    pub fn new(transform: &NormalizationTransform, size: usize) -> Self {
        Self {
            center: [transform.center.x, transform.center.y, transform.center.z],
            scale: transform.scale,
            level: Self::level_for(size),
            size,
        }
    }

    /// Iso-level used for surface extraction on a grid of `size` cells
    pub fn level_for(size: usize) -> f64 {
        1.0 / size as f64
    }

    /// The transform recorded in this metadata
    pub fn transform(&self) -> NormalizationTransform {
        NormalizationTransform::new(
            Point3d::new(self.center[0], self.center[1], self.center[2]),
            self.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bounds(min: [f64; 3], max: [f64; 3]) -> BoundingBox {
        BoundingBox::new(
            Point3d::new(min[0], min[1], min[2]),
            Point3d::new(max[0], max[1], max[2]),
        )
    }

    #[test]
    fn test_scenario_values() {
        let t = NormalizationTransform::from_bounds(&bounds([0.0, 0.0, 0.0], [4.0, 2.0, 1.0]), 0.8)
            .unwrap();
        assert_relative_eq!(t.center, Point3d::new(2.0, 1.0, 0.5));
        assert_relative_eq!(t.scale, 0.4, epsilon = 1e-12);

        let v = t.normalize_point(&Point3d::new(4.0, 2.0, 1.0));
        assert_relative_eq!(v, Point3d::new(0.8, 0.4, 0.2), epsilon = 1e-12);
    }

    #[test]
    fn test_longest_axis_maps_to_mesh_scale() {
        let bb = bounds([-3.0, 1.0, 2.0], [5.0, 2.0, 4.5]);
        let mesh_scale = 0.8;
        let t = NormalizationTransform::from_bounds(&bb, mesh_scale).unwrap();

        let lo = t.normalize_point(&bb.min);
        let hi = t.normalize_point(&bb.max);
        assert_relative_eq!(lo.x, -mesh_scale, epsilon = 1e-12);
        assert_relative_eq!(hi.x, mesh_scale, epsilon = 1e-12);
        for axis in 1..3 {
            assert!(lo[axis] >= -mesh_scale - 1e-12);
            assert!(hi[axis] <= mesh_scale + 1e-12);
        }
    }

    #[test]
    fn test_round_trip() {
        let t = NormalizationTransform::new(Point3d::new(1.25, -7.5, 3.0), 0.0371);
        let p = Point3d::new(12.0, -3.3, 0.125);
        let back = t.denormalize_point(&t.normalize_point(&p));
        assert_relative_eq!(back, p, epsilon = 1e-10);
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        let flat = bounds([1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        assert!(NormalizationTransform::from_bounds(&flat, 0.8).is_err());
        let bb = bounds([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert!(NormalizationTransform::from_bounds(&bb, 0.0).is_err());
    }

    #[test]
    fn test_metadata_level_and_transform() {
        let t = NormalizationTransform::new(Point3d::new(2.0, 1.0, 0.5), 0.4);
        let meta = SdfMetadata::new(&t, 256);
        assert_relative_eq!(meta.level, 0.00390625);
        assert_eq!(meta.size, 256);
        assert_eq!(meta.center, [2.0, 1.0, 0.5]);
        assert_eq!(meta.transform(), t);
    }

    #[test]
    fn test_mesh_round_trip() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(4.0, 2.0, 1.0),
                Point3f::new(1.0, 2.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let original = mesh.vertices.clone();
        let t = NormalizationTransform::from_mesh(&mesh, 0.8).unwrap();

        t.normalize_mesh(&mut mesh);
        assert_relative_eq!(mesh.vertices[1], Point3f::new(0.8, 0.4, 0.2), epsilon = 1e-6);

        t.denormalize_mesh(&mut mesh);
        for (a, b) in mesh.vertices.iter().zip(&original) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }
}
