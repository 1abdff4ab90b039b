//! Surface voxelization
//!
//! Every triangle is sampled densely enough that no voxel it passes through is
//! missed, and each sample marks the voxel containing it. The result is an
//! occupancy grid (1.0 occupied, 0.0 empty) whose samples sit at voxel centers.

use crate::marching_cubes::VolumetricGrid;
use dartprep_core::{to_point3d, Error, Point3d, Point3f, Result, TriangleMesh};
use ndarray::Array3;
use tracing::debug;

/// Voxelize the surface of `mesh` with cubic voxels of side `pitch`
///
/// The grid is padded with one empty voxel on every side so iso-surfaces
/// extracted from it are closed.
pub fn voxelize_surface(mesh: &TriangleMesh, pitch: f64) -> Result<VolumetricGrid> {
    if !(pitch > 0.0) || !pitch.is_finite() {
        return Err(Error::InvalidData(format!("Voxel pitch must be positive, got {}", pitch)));
    }
    let bounds = mesh
        .bounding_box()
        .ok_or_else(|| Error::InvalidData("Cannot voxelize a mesh without vertices".to_string()))?;
    mesh.validate_indices()?;

    let extents = bounds.extents();
    let dims = [
        (extents.x / pitch).floor() as usize + 3,
        (extents.y / pitch).floor() as usize + 3,
        (extents.z / pitch).floor() as usize + 3,
    ];
    let mut occupancy = Array3::<f32>::zeros((dims[0], dims[1], dims[2]));

    let voxel_of = |p: &Point3d| -> [usize; 3] {
        let mut idx = [0usize; 3];
        for k in 0..3 {
            let cell = ((p[k] - bounds.min[k]) / pitch).floor().max(0.0) as usize + 1;
            idx[k] = cell.min(dims[k] - 2);
        }
        idx
    };

    let step = pitch * 0.5;
    for face in &mesh.faces {
        let a = to_point3d(&mesh.vertices[face[0]]);
        let b = to_point3d(&mesh.vertices[face[1]]);
        let c = to_point3d(&mesh.vertices[face[2]]);
        let (ab, ac) = (b - a, c - a);

        let longest = ab.norm().max(ac.norm()).max((c - b).norm());
        let n = ((longest / step).ceil() as usize).max(1);

        for i in 0..=n {
            for j in 0..=(n - i) {
                let p = a + ab * (i as f64 / n as f64) + ac * (j as f64 / n as f64);
                occupancy[voxel_of(&p)] = 1.0;
            }
        }
    }

    let origin = Point3f::new(
        (bounds.min.x - 0.5 * pitch) as f32,
        (bounds.min.y - 0.5 * pitch) as f32,
        (bounds.min.z - 0.5 * pitch) as f32,
    );

    debug!(
        dims = ?dims,
        pitch,
        occupied = occupancy.iter().filter(|&&v| v > 0.0).count(),
        "Voxelized surface"
    );

    Ok(VolumetricGrid::from_values(occupancy, pitch as f32, origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_dimensions_include_padding() {
        let grid = voxelize_surface(&unit_square(), 0.25).unwrap();
        assert_eq!(grid.dimensions(), [7, 7, 3]);
    }

    #[test]
    fn test_padding_is_empty() {
        let grid = voxelize_surface(&unit_square(), 0.25).unwrap();
        let [nx, ny, nz] = grid.dimensions();
        for x in 0..nx {
            for y in 0..ny {
                assert_eq!(grid.values[[x, y, 0]], 0.0);
                assert_eq!(grid.values[[x, y, nz - 1]], 0.0);
            }
        }
        for y in 0..ny {
            assert_eq!(grid.values[[0, y, 1]], 0.0);
            assert_eq!(grid.values[[nx - 1, y, 1]], 0.0);
        }
    }

    #[test]
    fn test_square_fills_its_layer() {
        let grid = voxelize_surface(&unit_square(), 0.25).unwrap();
        for x in 1..6 {
            for y in 1..6 {
                assert_eq!(grid.values[[x, y, 1]], 1.0, "voxel ({x}, {y}) should be occupied");
            }
        }
    }

    #[test]
    fn test_invalid_input() {
        assert!(voxelize_surface(&unit_square(), 0.0).is_err());
        assert!(voxelize_surface(&TriangleMesh::new(), 0.1).is_err());
    }
}
