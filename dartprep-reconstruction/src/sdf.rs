//! Signed distance fields with surface repair
//!
//! All backends work in normalized space: the grid spans the cube `[-1, 1]^3`
//! with `size` samples per axis, and sample `[i, j, k]` sits at the center of
//! its cell, `-1 + (index + 0.5) * 2 / size` on each axis. Values are negative
//! inside the surface. The array is indexed `[x, y, z]`.

use crate::components::largest_component;
use crate::marching_cubes::{MarchingCubes, MarchingCubesConfig, VolumetricGrid};
use dartprep_core::{Error, Point3f, Result, TriangleMesh};
use mesh_to_sdf::{generate_grid_sdf, Grid, SignMethod, Topology};
use ndarray::Array3;
use std::collections::VecDeque;
use tracing::{debug, info};

/// A dense distance grid and the closed surface it was measured against
#[derive(Debug, Clone)]
pub struct SdfOutput {
    /// Signed distances, shape `(size, size, size)`
    pub grid: Array3<f32>,
    /// The repaired surface in normalized coordinates
    pub mesh: TriangleMesh,
}

/// Computes a signed distance field and a repaired surface for a normalized mesh
pub trait SdfBackend {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// `vertices` are already normalized into `[-1, 1]^3`; `level` is the
    /// iso-level at which the repaired surface is extracted.
    fn compute(
        &self,
        vertices: &[Point3f],
        faces: &[[usize; 3]],
        size: usize,
        level: f64,
    ) -> Result<SdfOutput>;
}

/// Normalized coordinate of sample `index` on a grid with `size` samples
pub fn sample_coordinate(index: usize, size: usize) -> f64 {
    -1.0 + (index as f64 + 0.5) * 2.0 / size as f64
}

/// Repairing backend
///
/// 1. Unsigned distance of the input surface at every sample.
/// 2. Marching cubes on that field at `level`, which wraps the input in a thin
///    closed shell regardless of holes or inconsistent winding.
/// 3. Optionally keep only the largest shell component (by bounding-box extent),
///    dropping the inner wall of the shell and stray fragments.
/// 4. Distance to the repaired surface at every sample. The sign comes from a
///    flood fill of the unsigned field: samples reachable from the grid border
///    without crossing a sample at or below `level` are outside, every other
///    sample is inside and gets a negative value.
#[derive(Debug, Clone)]
pub struct RepairingSdf {
    pub keep_largest_component: bool,
}

impl Default for RepairingSdf {
    fn default() -> Self {
        Self {
            keep_largest_component: true,
        }
    }
}

impl RepairingSdf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_largest_component(mut self, keep: bool) -> Self {
        self.keep_largest_component = keep;
        self
    }
}

impl SdfBackend for RepairingSdf {
    fn name(&self) -> &str {
        "repairing"
    }

    fn compute(
        &self,
        vertices: &[Point3f],
        faces: &[[usize; 3]],
        size: usize,
        level: f64,
    ) -> Result<SdfOutput> {
        if size < 2 {
            return Err(Error::InvalidData(format!(
                "SDF grid needs at least 2 samples per axis, got {}",
                size
            )));
        }
        if faces.is_empty() {
            return Err(Error::InvalidData("Cannot compute an SDF of a mesh without faces".to_string()));
        }

        let input = TriangleMesh::from_vertices_and_faces(vertices.to_vec(), faces.to_vec());
        input.validate_indices()?;

        let unsigned = unsigned_distance_grid(&input, size)?;
        debug!(size, "Computed unsigned distance field");

        let voxel_size = 2.0 / size as f32;
        let first = -1.0 + 0.5 * voxel_size;
        let field = VolumetricGrid::from_values(unsigned, voxel_size, Point3f::new(first, first, first));
        let shell = MarchingCubes::new(MarchingCubesConfig::default().with_iso_level(level as f32))
            .extract_isosurface(&field)?;

        let repaired = if self.keep_largest_component {
            largest_component(&shell)
                .ok_or_else(|| Error::Algorithm("Repaired surface has no faces".to_string()))?
        } else {
            shell
        };

        let outside = outside_mask(&field.values, level as f32);
        let mut grid = unsigned_distance_grid(&repaired, size)?;
        ndarray::Zip::from(&mut grid).and(&outside).for_each(|d, &out| {
            if !out {
                *d = -*d;
            }
        });
        info!(
            backend = self.name(),
            size,
            level,
            shell_faces = repaired.face_count(),
            "Computed signed distance field"
        );

        Ok(SdfOutput {
            grid,
            mesh: repaired,
        })
    }
}

/// Samples connected to the grid border through samples farther than `level` from the surface
///
/// 6-connected breadth-first fill. Samples at or below `level` form the wall.
fn outside_mask(unsigned: &Array3<f32>, level: f32) -> Array3<bool> {
    let (nx, ny, nz) = unsigned.dim();
    let mut outside = Array3::from_elem((nx, ny, nz), false);
    let mut queue = VecDeque::new();

    for ((x, y, z), &d) in unsigned.indexed_iter() {
        let on_border = x == 0 || y == 0 || z == 0 || x + 1 == nx || y + 1 == ny || z + 1 == nz;
        if on_border && d > level {
            outside[[x, y, z]] = true;
            queue.push_back([x, y, z]);
        }
    }

    while let Some([x, y, z]) = queue.pop_front() {
        let mut visit = |cell: [usize; 3]| {
            if !outside[cell] && unsigned[cell] > level {
                outside[cell] = true;
                queue.push_back(cell);
            }
        };
        if x > 0 {
            visit([x - 1, y, z]);
        }
        if x + 1 < nx {
            visit([x + 1, y, z]);
        }
        if y > 0 {
            visit([x, y - 1, z]);
        }
        if y + 1 < ny {
            visit([x, y + 1, z]);
        }
        if z > 0 {
            visit([x, y, z - 1]);
        }
        if z + 1 < nz {
            visit([x, y, z + 1]);
        }
    }

    outside
}

/// Sample the unsigned distance to `mesh` at every cell center of the `[-1, 1]^3` grid
fn unsigned_distance_grid(mesh: &TriangleMesh, size: usize) -> Result<Array3<f32>> {
    let points: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| [v.x, v.y, v.z]).collect();
    let indices: Vec<u32> = mesh
        .faces
        .iter()
        .flat_map(|f| f.iter())
        .map(|&i| u32::try_from(i))
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::InvalidData("Mesh has too many vertices for 32-bit indices".to_string()))?;

    let grid = Grid::from_bounding_box(&[-1.0f32, -1.0, -1.0], &[1.0f32, 1.0, 1.0], [size, size, size]);
    let values = generate_grid_sdf(
        &points,
        Topology::TriangleList(Some(indices.as_slice())),
        &grid,
        SignMethod::Normal,
    );

    // z varies fastest, which is C order for an [x, y, z] array
    Array3::from_shape_vec((size, size, size), values)
        .map(|grid| grid.mapv(f32::abs))
        .map_err(|e| Error::Algorithm(format!("Distance grid has unexpected shape: {}", e)))
}
