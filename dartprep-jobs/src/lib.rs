//! Scene preprocessing jobs
//!
//! Three independent jobs, each reading a mesh file and writing its results
//! next to it:
//! - Floor synthesis: append a flat patch at z = 0 under the scene
//! - Mesh simplification: clean and reduce the face count with fallbacks
//! - SDF generation: normalized signed distance grid, repaired mesh, metadata
//!
//! Jobs share no state and communicate only through files. The pipeline runs
//! them in order using the usual output names.

pub mod config;
pub mod floor;
pub mod simplify;
pub mod sdf;
pub mod pipeline;
pub mod logging;

pub use config::*;
pub use floor::*;
pub use simplify::*;
pub use sdf::*;
pub use pipeline::*;
pub use logging::init_tracing;

use dartprep_core::{BoundingBox, TriangleMesh};
use serde::Serialize;

/// Vertex/face counts and bounds of a mesh at one stage of a job
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshSummary {
    pub vertices: usize,
    pub faces: usize,
    pub bounds: Option<BoundingBox>,
}

impl MeshSummary {
    pub fn of(mesh: &TriangleMesh) -> Self {
        Self {
            vertices: mesh.vertex_count(),
            faces: mesh.face_count(),
            bounds: mesh.bounding_box(),
        }
    }
}

impl std::fmt::Display for MeshSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} vertices, {} faces", self.vertices, self.faces)?;
        if let Some(bounds) = &self.bounds {
            write!(f, ", bounds {}", bounds)?;
        }
        Ok(())
    }
}
