//! Floor-synthesis job

use crate::config::FloorConfig;
use crate::MeshSummary;
use dartprep_core::{with_floor, Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// What the floor-synthesis job did
#[derive(Debug, Clone, Serialize)]
pub struct FloorReport {
    pub input: MeshSummary,
    pub output: MeshSummary,
    pub margin: f64,
}

/// Conventional output path for a scene named `name`
pub fn floor_output_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}_scene_with_floor.obj", name))
}

/// Load `input`, append a floor patch under it and write the merged mesh to `output`
pub fn run_floor(input: &Path, output: &Path, config: &FloorConfig) -> Result<FloorReport> {
    info!(path = %input.display(), "Loading scene");
    let scene = dartprep_io::read_mesh(input)?;
    let original = MeshSummary::of(&scene);
    info!(%original, "Original mesh");

    let merged = with_floor(&scene, config.margin).ok_or_else(|| {
        Error::InvalidData(format!("{} has no vertices to place a floor under", input.display()))
    })?;

    dartprep_io::write_mesh(&merged, output)?;
    let summary = MeshSummary::of(&merged);
    info!(path = %output.display(), %summary, "Saved scene with floor");

    Ok(FloorReport {
        input: original,
        output: summary,
        margin: config.margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_convention() {
        assert_eq!(
            floor_output_path(Path::new("/data/cab_g_benches"), "cab_g_benches"),
            PathBuf::from("/data/cab_g_benches/cab_g_benches_scene_with_floor.obj")
        );
    }
}
