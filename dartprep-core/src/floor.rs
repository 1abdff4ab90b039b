//! Floor patch synthesis
//!
//! A floor patch is a flat quad at z = 0 covering a scene's horizontal
//! footprint. It is built once per floor-synthesis run, merged into the scene
//! mesh and then dropped.

use crate::bounds::BoundingBox;
use crate::mesh::TriangleMesh;
use crate::point::*;

/// Two triangles sharing the 0-2 diagonal, relative to the patch's own vertices
pub const FLOOR_FACES: [[usize; 3]; 2] = [[0, 1, 2], [0, 2, 3]];

/// Four corners of a rectangular floor at z = 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorPatch {
    pub corners: [Point3d; 4],
}

impl FloorPatch {
    /// Build a floor covering `bounds` in x and y, grown by `margin` on each side
    pub fn from_bounds(bounds: &BoundingBox, margin: f64) -> Self {
        let footprint = bounds.expanded_xy(margin);
        let (lo, hi) = (footprint.min, footprint.max);
        Self {
            corners: [
                Point3d::new(lo.x, lo.y, 0.0),
                Point3d::new(hi.x, lo.y, 0.0),
                Point3d::new(hi.x, hi.y, 0.0),
                Point3d::new(lo.x, hi.y, 0.0),
            ],
        }
    }

    /// The patch as a standalone 4-vertex, 2-face mesh
    pub fn to_mesh(&self) -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            self.corners.iter().map(to_point3f).collect(),
            FLOOR_FACES.to_vec(),
        )
    }
}

/// Return `scene` with a floor patch appended after its own geometry
///
/// Returns `None` when the scene has no vertices to take a footprint from.
pub fn with_floor(scene: &TriangleMesh, margin: f64) -> Option<TriangleMesh> {
    let bounds = scene.bounding_box()?;
    let floor = FloorPatch::from_bounds(&bounds, margin);

    let mut merged = scene.clone();
    merged.append(&floor.to_mesh());
    Some(merged)
}
