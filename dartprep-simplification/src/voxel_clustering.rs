//! Voxel clustering simplification
//!
//! Replaces the surface by the boundary of its voxelization: every vertex
//! within one voxel is effectively merged into the extracted iso-surface.

use crate::SimplificationStrategy;
use dartprep_core::{Error, Result, TriangleMesh};
use dartprep_reconstruction::{marching_cubes, voxelize_surface};
use tracing::debug;

/// Occupancy level at which the voxel boundary is extracted
const OCCUPANCY_LEVEL: f32 = 0.5;

/// Voxel clustering with a pitch relative to the mesh size
///
/// The pitch is `max_extent / pitch_divisor`. The face budget is not
/// enforced: the voxel resolution alone decides the output size.
#[derive(Debug, Clone)]
pub struct VoxelClustering {
    pub pitch_divisor: f64,
}

impl Default for VoxelClustering {
    fn default() -> Self {
        Self { pitch_divisor: 100.0 }
    }
}

impl VoxelClustering {
    pub fn new(pitch_divisor: f64) -> Self {
        Self { pitch_divisor }
    }

    /// Voxel side length used for `mesh`
    pub fn pitch_for(&self, mesh: &TriangleMesh) -> Result<f64> {
        if !(self.pitch_divisor > 0.0) {
            return Err(Error::InvalidData(format!(
                "Pitch divisor must be positive, got {}",
                self.pitch_divisor
            )));
        }
        let bounds = mesh
            .bounding_box()
            .ok_or_else(|| Error::Algorithm("Mesh is empty".to_string()))?;
        let pitch = bounds.max_extent() / self.pitch_divisor;
        if !(pitch > 0.0) || !pitch.is_finite() {
            return Err(Error::Algorithm(format!(
                "Mesh extent {} yields an unusable voxel pitch",
                bounds.max_extent()
            )));
        }
        Ok(pitch)
    }
}

impl SimplificationStrategy for VoxelClustering {
    fn name(&self) -> &str {
        "voxel_clustering"
    }

    fn simplify(&self, mesh: &TriangleMesh, _target_faces: usize) -> Result<TriangleMesh> {
        if mesh.faces.is_empty() {
            return Err(Error::Algorithm("Mesh has no faces".to_string()));
        }
        let pitch = self.pitch_for(mesh)?;
        let occupancy = voxelize_surface(mesh, pitch)?;
        let surface = marching_cubes(&occupancy, OCCUPANCY_LEVEL)?;
        debug!(pitch, faces = surface.face_count(), "Voxel clustering finished");
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dartprep_core::Point3f;

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.5, 1.0, 0.0),
                Point3f::new(0.5, 0.5, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
    }

    #[test]
    fn test_pitch_is_relative_to_extent() {
        let pitch = VoxelClustering::new(10.0).pitch_for(&tetrahedron()).unwrap();
        assert!((pitch - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_surface_stays_near_input() {
        let mesh = tetrahedron();
        let strategy = VoxelClustering::new(20.0);
        let out = strategy.simplify(&mesh, 0).unwrap();

        assert!(!out.is_empty());
        assert!(out.validate_indices().is_ok());
        let pitch = strategy.pitch_for(&mesh).unwrap();
        let input = mesh.bounding_box().unwrap();
        assert!(input.contains_box(&out.bounding_box().unwrap(), 2.0 * pitch));
    }

    #[test]
    fn test_degenerate_extent_fails() {
        // All vertices coincide
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![Point3f::new(1.0, 1.0, 1.0); 3],
            vec![[0, 1, 2]],
        );
        assert!(VoxelClustering::default().simplify(&mesh, 1).is_err());
    }

    #[test]
    fn test_rejects_bad_divisor() {
        assert!(matches!(
            VoxelClustering::new(0.0).pitch_for(&tetrahedron()),
            Err(Error::InvalidData(_))
        ));
    }
}
