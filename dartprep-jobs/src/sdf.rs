//! SDF-generation job
//!
//! The mesh is normalized so its longest axis spans `[-mesh_scale, mesh_scale]`,
//! the backend computes the grid and a repaired surface in that space, and
//! the surface is mapped back to scene coordinates before it is written. The
//! metadata file records the transform so grid samples can be placed in the
//! scene later.

use crate::config::SdfConfig;
use crate::MeshSummary;
use dartprep_core::{to_point3f, Error, NormalizationTransform, Result, SdfMetadata};
use dartprep_reconstruction::SdfBackend;
use ndarray::Array3;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stem shared by the three output files
pub const SDF_STEM: &str = "scene_sdf";

/// Where the SDF job writes its outputs inside a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdfOutputPaths {
    pub mesh: PathBuf,
    pub grid: PathBuf,
    pub metadata: PathBuf,
}

impl SdfOutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            mesh: dir.join(format!("{}.obj", SDF_STEM)),
            grid: dir.join(format!("{}.npy", SDF_STEM)),
            metadata: dir.join(format!("{}.json", SDF_STEM)),
        }
    }
}

/// Summary of a persisted SDF grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SdfStats {
    pub shape: [usize; 3],
    pub min: f32,
    pub max: f32,
    /// Samples strictly below zero
    pub negative: usize,
    /// Samples strictly above zero
    pub positive: usize,
}

impl SdfStats {
    pub fn of(grid: &Array3<f32>) -> Self {
        let (nx, ny, nz) = grid.dim();
        let mut stats = Self {
            shape: [nx, ny, nz],
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            negative: 0,
            positive: 0,
        };
        for &v in grid.iter() {
            stats.min = stats.min.min(v);
            stats.max = stats.max.max(v);
            if v < 0.0 {
                stats.negative += 1;
            } else if v > 0.0 {
                stats.positive += 1;
            }
        }
        stats
    }
}

/// What the SDF job did
#[derive(Debug, Clone, Serialize)]
pub struct SdfReport {
    pub input: MeshSummary,
    /// The repaired surface, in scene coordinates
    pub repaired: MeshSummary,
    pub metadata: SdfMetadata,
    pub paths: SdfOutputPaths,
    /// Computed from the grid as re-read from disk
    pub stats: SdfStats,
}

/// Compute the SDF of `input` and write mesh, grid and metadata into `out_dir`
///
/// Nothing is written unless the computation succeeds. Computation failures
/// are reported as [`Error::SdfComputation`] naming the input and grid size.
pub fn run_sdf(
    input: &Path,
    out_dir: &Path,
    config: &SdfConfig,
    backend: &dyn SdfBackend,
) -> Result<SdfReport> {
    std::fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

    info!(path = %input.display(), "Processing scene");
    let mesh = dartprep_io::read_mesh(input)?;
    let original = MeshSummary::of(&mesh);
    info!(%original, "Original mesh");

    let failed = |e: Error| Error::SdfComputation {
        input: input.to_path_buf(),
        size: config.size,
        reason: e.to_string(),
    };

    let transform = NormalizationTransform::from_mesh(&mesh, config.mesh_scale).map_err(failed)?;
    let metadata = SdfMetadata::new(&transform, config.size);
    info!(
        center = ?metadata.center,
        scale = metadata.scale,
        level = metadata.level,
        "Normalization"
    );

    let normalized: Vec<_> = transform
        .normalized_vertices(&mesh)
        .iter()
        .map(to_point3f)
        .collect();

    info!(size = config.size, backend = backend.name(), "Starting SDF computation");
    let output = backend
        .compute(&normalized, &mesh.faces, config.size, metadata.level)
        .map_err(failed)?;
    let expected = [config.size; 3];
    if output.grid.shape() != expected {
        return Err(failed(Error::Algorithm(format!(
            "Backend returned a grid of shape {:?}, expected {:?}",
            output.grid.shape(),
            expected
        ))));
    }
    info!("SDF computation completed");

    let mut repaired = output.mesh;
    transform.denormalize_mesh(&mut repaired);

    let paths = SdfOutputPaths::in_dir(out_dir);
    dartprep_io::write_mesh(&repaired, &paths.mesh)?;
    info!(path = %paths.mesh.display(), "Saved repaired mesh");
    dartprep_io::write_sdf_grid(&output.grid, &paths.grid)?;
    info!(path = %paths.grid.display(), "Saved SDF grid");
    dartprep_io::write_sdf_metadata(&metadata, &paths.metadata)?;
    info!(path = %paths.metadata.display(), "Saved SDF metadata");

    let reloaded = dartprep_io::read_sdf_grid(&paths.grid)?;
    let stats = SdfStats::of(&reloaded);
    debug!(samples = reloaded.len(), "Reloaded SDF grid");
    info!(
        shape = ?stats.shape,
        min = format_args!("{:.4}", stats.min),
        max = format_args!("{:.4}", stats.max),
        negative = stats.negative,
        positive = stats.positive,
        "Validated SDF data"
    );

    Ok(SdfReport {
        input: original,
        repaired: MeshSummary::of(&repaired),
        metadata,
        paths,
        stats,
    })
}
