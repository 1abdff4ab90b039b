//! Mesh simplification for scene preprocessing
//!
//! This crate reduces the face count of scene meshes:
//! - Cleanup of duplicate/degenerate faces and coincident vertices
//! - Quadric error edge-collapse decimation
//! - Voxel clustering
//! - An ordered fallback chain over the strategies above

pub mod quadric_error;
pub mod cleanup;
pub mod edge_collapse;
pub mod voxel_clustering;
pub mod chain;

pub use quadric_error::*;
pub use cleanup::*;
pub use edge_collapse::*;
pub use voxel_clustering::*;
pub use chain::*;

use dartprep_core::{Result, TriangleMesh};

/// One way of reducing a mesh to a face budget
pub trait SimplificationStrategy {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Simplify `mesh` towards at most `target_faces` faces
    fn simplify(&self, mesh: &TriangleMesh, target_faces: usize) -> Result<TriangleMesh>;
}
