//! compress-scene: clean a scene mesh and reduce it to a face budget.
//!
//! Tries quadric decimation first, then voxel clustering, and keeps the
//! cleaned mesh if both fail.
//!
//! ```bash
//! RUST_LOG=dartprep_simplification=debug compress-scene scene.obj -o scene_small.obj
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dartprep_jobs::{init_tracing, run_simplify, SimplifyConfig};

/// Simplify a scene mesh with quadric decimation and fallbacks
#[derive(Parser)]
#[command(name = "compress-scene")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input mesh file
    input: PathBuf,

    /// Output mesh file
    #[arg(short, long)]
    output: PathBuf,

    /// Maximum number of faces in the output
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

    let config = SimplifyConfig::default()
        .with_target_faces(cli.target_faces)
        .with_voxel_pitch_divisor(cli.pitch_divisor)
        .with_merge_tolerance(cli.merge_tolerance)
        .with_area_epsilon(cli.area_epsilon);

    let report = run_simplify(&cli.input, &cli.output, &config)
        .with_context(|| format!("Failed to compress {:?}", cli.input))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
