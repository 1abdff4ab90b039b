//! JSON sidecar describing how an SDF grid maps back to scene space

use dartprep_core::{Error, Result, SdfMetadata};
use std::path::Path;
use tracing::debug;

/// Write metadata as pretty-printed JSON (two-space indent)
pub fn write_sdf_metadata<P: AsRef<Path>>(metadata: &SdfMetadata, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| Error::Serialization(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| Error::io(path, e))?;

    debug!(path = %path.display(), "Wrote SDF metadata");
    Ok(())
}

/// Read metadata written by [`write_sdf_metadata`]
pub fn read_sdf_metadata<P: AsRef<Path>>(path: P) -> Result<SdfMetadata> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
