//! prepare-scene: floor, simplification and SDF in one run.
//!
//! ```bash
//! prepare-scene cab_g_benches.obj --out-dir processed/cab_g_benches --name cab_g_benches -v
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dartprep_jobs::{
    init_tracing, run_pipeline, FloorConfig, PipelineConfig, SdfConfig, SimplifyConfig,
};
use dartprep_reconstruction::RepairingSdf;

/// Prepare a scene mesh for interaction synthesis
#[derive(Parser)]
#[command(name = "prepare-scene")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input scene mesh
    input: PathBuf,

    /// Output directory, created if missing
    #[arg(short, long)]
    out_dir: PathBuf,

    /// Scene name used for intermediate file names (defaults to the input stem)
    #[arg(long)]
    name: Option<String>,

    /// Distance the floor extends past the scene on each side
    #[arg(long, default_value_t = FloorConfig::default().margin)]
    margin: f64,

    /// Maximum number of faces after simplification
    #[arg(long, default_value_t = SimplifyConfig::default().target_faces)]
    target_faces: usize,

    /// Voxel clustering pitch is the largest extent divided by this
    #[arg(long, default_value_t = SimplifyConfig::default().voxel_pitch_divisor)]
    pitch_divisor: f64,

    /// Cleanup merges vertices that agree after rounding to this step (0: identical only)
    #[arg(long, default_value_t = SimplifyConfig::default().cleanup.merge_tolerance)]
    merge_tolerance: f64,

    /// Faces with an area at or below this are dropped during cleanup
    #[arg(long, default_value_t = SimplifyConfig::default().cleanup.area_epsilon)]
    area_epsilon: f64,

    /// Grid samples per axis
    #[arg(long, default_value_t = SdfConfig::default().size)]
    size: usize,

    /// Half-width the longest scene axis is scaled to
    #[arg(long, default_value_t = SdfConfig::default().mesh_scale)]
    mesh_scale: f64,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Suppress all log output
    #[arg(long, short)]
    quiet: bool,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let name = match &cli.name {
        Some(name) => name.clone(),
        None => cli
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive a scene name from {:?}", cli.input))?,
    };

    let config = PipelineConfig {
        floor: FloorConfig::default().with_margin(cli.margin),
        simplify: SimplifyConfig::default()
            .with_target_faces(cli.target_faces)
            .with_voxel_pitch_divisor(cli.pitch_divisor)
            .with_merge_tolerance(cli.merge_tolerance)
            .with_area_epsilon(cli.area_epsilon),
        sdf: SdfConfig::default()
            .with_size(cli.size)
            .with_mesh_scale(cli.mesh_scale),
    };

    let report = run_pipeline(&cli.input, &cli.out_dir, &name, &config, &RepairingSdf::new())
        .with_context(|| format!("Failed to prepare scene {:?}", cli.input))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
