//! NumPy `.npy` storage for SDF grids
//!
//! Grids are stored as little-endian `float32` arrays of shape `(n, n, n)` in
//! C order, so `numpy.load` returns them indexed `[x, y, z]`.

use dartprep_core::{Error, Result};
use ndarray::Array3;
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyError, WriteNpyExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Write an SDF grid to `path`
pub fn write_sdf_grid<P: AsRef<Path>>(grid: &Array3<f32>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);

    grid.write_npy(&mut writer).map_err(|e| match e {
        WriteNpyError::Io(source) => Error::io(path, source),
        other => Error::Serialization(format!("{}: {}", path.display(), other)),
    })?;
    writer.flush().map_err(|e| Error::io(path, e))?;

    debug!(path = %path.display(), shape = ?grid.shape(), "Wrote SDF grid");
    Ok(())
}

/// Read an SDF grid written by [`write_sdf_grid`]
pub fn read_sdf_grid<P: AsRef<Path>>(path: P) -> Result<Array3<f32>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;

    Array3::<f32>::read_npy(BufReader::new(file)).map_err(|e| match e {
        ReadNpyError::Io(source) => Error::io(path, source),
        other => Error::Parse {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })
}
