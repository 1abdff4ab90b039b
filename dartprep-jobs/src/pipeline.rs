//! Scene preparation: floor, then simplification, then SDF
//!
//! Each stage reads the file the previous stage wrote, so any stage can also
//! be rerun on its own with the matching binary.

use crate::config::{FloorConfig, SdfConfig, SimplifyConfig};
use crate::floor::{floor_output_path, run_floor, FloorReport};
use crate::sdf::{run_sdf, SdfReport};
use crate::simplify::{run_simplify, SimplifyReport};
use dartprep_core::{Error, Result};
use dartprep_reconstruction::SdfBackend;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration of every pipeline stage
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub floor: FloorConfig,
    pub simplify: SimplifyConfig,
    pub sdf: SdfConfig,
}

/// Reports of every pipeline stage
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub floor_mesh: PathBuf,
    pub simplified_mesh: PathBuf,
    pub floor: FloorReport,
    pub simplify: SimplifyReport,
    pub sdf: SdfReport,
}

/// Conventional path of the simplified floor scene for a scene named `name`
pub fn simplified_output_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}_scene_with_floor_small.obj", name))
}

/// Run all three jobs on `input`, writing every output into `out_dir`
pub fn run_pipeline(
    input: &Path,
    out_dir: &Path,
    name: &str,
    config: &PipelineConfig,
    backend: &dyn SdfBackend,
) -> Result<PipelineReport> {
    std::fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

    let floor_mesh = floor_output_path(out_dir, name);
    let simplified_mesh = simplified_output_path(out_dir, name);

    info!(stage = "floor", path = %floor_mesh.display(), "Starting stage");
    let floor = run_floor(input, &floor_mesh, &config.floor)?;

    info!(stage = "simplify", path = %simplified_mesh.display(), "Starting stage");
    let simplify = run_simplify(&floor_mesh, &simplified_mesh, &config.simplify)?;

    info!(stage = "sdf", path = %out_dir.display(), "Starting stage");
    let sdf = run_sdf(&simplified_mesh, out_dir, &config.sdf, backend)?;

    info!(name, "Scene preparation complete");
    Ok(PipelineReport {
        floor_mesh,
        simplified_mesh,
        floor,
        simplify,
        sdf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplified_path_convention() {
        assert_eq!(
            simplified_output_path(Path::new("scenes"), "seminar_g110"),
            PathBuf::from("scenes/seminar_g110_scene_with_floor_small.obj")
        );
    }
}
