//! File I/O for dartprep
//!
//! This crate reads and writes the three file kinds the preprocessing jobs
//! touch: OBJ triangle meshes, NumPy `.npy` SDF grids and the JSON metadata
//! that accompanies each grid.

pub mod obj;
pub mod npy;
pub mod metadata;

pub use metadata::{read_sdf_metadata, write_sdf_metadata};
pub use npy::{read_sdf_grid, write_sdf_grid};
pub use self::obj::{ObjReader, ObjWriter};

use dartprep_core::{Error, Result, TriangleMesh};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Auto-detect format and read mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("obj") => ObjReader::read_mesh(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {}",
            path.display()
        ))),
    }
}

/// Auto-detect format and write mesh
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("obj") => ObjWriter::write_mesh(mesh, path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {}",
            path.display()
        ))),
    }
}
