//! Mesh-simplification job

use crate::config::SimplifyConfig;
use crate::MeshSummary;
use dartprep_core::Result;
use dartprep_simplification::CleanupStats;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// What the simplification job did
#[derive(Debug, Clone, Serialize)]
pub struct SimplifyReport {
    pub input: MeshSummary,
    pub cleaned_vertices: usize,
    pub cleaned_faces: usize,
    pub output: MeshSummary,
    /// Strategy that produced the output; `None` when no reduction was needed
    /// or every strategy failed
    pub strategy: Option<String>,
    /// Output faces over post-cleanup faces
    pub ratio: f64,
    #[serde(skip)]
    pub cleanup: CleanupStats,
}

/// Load `input`, clean and simplify it, and write the result to `output`
///
/// Algorithmic failures are absorbed by the fallback chain; only I/O and
/// format errors propagate.
pub fn run_simplify(input: &Path, output: &Path, config: &SimplifyConfig) -> Result<SimplifyReport> {
    info!(path = %input.display(), "Loading mesh");
    let mesh = dartprep_io::read_mesh(input)?;
    let original = MeshSummary::of(&mesh);
    info!(%original, "Original mesh");

    let outcome = config.chain().simplify_mesh(&mesh, config.target_faces);
    info!(
        vertices = outcome.cleaned_vertices,
        faces = outcome.cleaned_faces,
        "Cleaned mesh"
    );
    let simplified = MeshSummary::of(&outcome.mesh);

    let ratio = if outcome.cleaned_faces == 0 {
        1.0
    } else {
        simplified.faces as f64 / outcome.cleaned_faces as f64
    };
    info!(
        %simplified,
        strategy = outcome.strategy.as_deref().unwrap_or("none"),
        ratio = format_args!("{:.4}", ratio),
        "Simplified mesh"
    );

    dartprep_io::write_mesh(&outcome.mesh, output)?;
    info!(path = %output.display(), "Saved simplified mesh");

    Ok(SimplifyReport {
        input: original,
        cleaned_vertices: outcome.cleaned_vertices,
        cleaned_faces: outcome.cleaned_faces,
        output: simplified,
        strategy: outcome.strategy,
        ratio,
        cleanup: outcome.cleanup,
    })
}
