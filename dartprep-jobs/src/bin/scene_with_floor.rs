//! scene-with-floor: append a flat floor at z = 0 under a scene mesh.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dartprep_jobs::{floor_output_path, init_tracing, run_floor, FloorConfig};

/// Add a floor patch covering the scene footprint
#[derive(Parser)]
#[command(name = "scene-with-floor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input mesh file
    input: PathBuf,

    /// Output mesh file
    #[arg(short, long, conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Write <NAME>_scene_with_floor.obj into this directory instead
    #[arg(long, requires = "name")]
    out_dir: Option<PathBuf>,

    /// Scene name used with --out-dir
    #[arg(long)]
    name: Option<String>,

    /// Distance the floor extends past the scene on each side
    #[arg(long, default_value_t = FloorConfig::default().margin)]
    margin: f64,

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

    let output = match (&cli.output, &cli.out_dir, &cli.name) {
        (Some(output), _, _) => output.clone(),
        (None, Some(dir), Some(name)) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory {:?}", dir))?;
            floor_output_path(dir, name)
        }
        _ => anyhow::bail!("Either --output or --out-dir with --name is required"),
    };

    let config = FloorConfig::default().with_margin(cli.margin);
    let report = run_floor(&cli.input, &output, &config)
        .with_context(|| format!("Failed to add a floor to {:?}", cli.input))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
