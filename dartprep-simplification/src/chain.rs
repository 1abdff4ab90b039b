//! Fallback chain of simplification strategies
//!
//! The chain cleans the input once, then tries each strategy in order and keeps
//! the first non-empty result. A failing strategy is logged and skipped.

use crate::cleanup::{clean_mesh, CleanupConfig, CleanupStats};
use crate::edge_collapse::EdgeCollapseSimplifier;
use crate::voxel_clustering::VoxelClustering;
use crate::SimplificationStrategy;
use dartprep_core::{Result, TriangleMesh};
use tracing::{info, warn};

/// Terminal strategy: the cleaned input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepCleaned;

impl SimplificationStrategy for KeepCleaned {
    fn name(&self) -> &str {
        "keep_cleaned"
    }

    fn simplify(&self, mesh: &TriangleMesh, _target_faces: usize) -> Result<TriangleMesh> {
        Ok(mesh.clone())
    }
}

/// Result of running the chain
#[derive(Debug, Clone)]
pub struct SimplificationOutcome {
    pub mesh: TriangleMesh,
    /// Name of the strategy that produced `mesh`; `None` when the cleaned
    /// input was already within budget
    pub strategy: Option<String>,
    /// Counts after cleanup, before any strategy ran
    pub cleaned_vertices: usize,
    pub cleaned_faces: usize,
    pub cleanup: CleanupStats,
}

/// Ordered strategies with a shared cleanup step
pub struct SimplificationChain {
    pub cleanup: CleanupConfig,
    strategies: Vec<Box<dyn SimplificationStrategy>>,
}

impl SimplificationChain {
    /// Chain with no strategies; the cleaned mesh is returned when all fail
    pub fn new(cleanup: CleanupConfig) -> Self {
        Self {
            cleanup,
            strategies: Vec::new(),
        }
    }

    /// Quadric decimation, then voxel clustering, then the cleaned input
    pub fn standard(cleanup: CleanupConfig, pitch_divisor: f64) -> Self {
        Self::new(cleanup)
            .with_strategy(EdgeCollapseSimplifier::new())
            .with_strategy(VoxelClustering::new(pitch_divisor))
            .with_strategy(KeepCleaned)
    }

    pub fn with_strategy(mut self, strategy: impl SimplificationStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Clean `mesh` and reduce it to at most `target_faces` faces when a
    /// strategy manages to
    ///
    /// Never fails: if every strategy fails the cleaned mesh is returned with
    /// `strategy` naming no strategy.
    pub fn simplify_mesh(&self, mesh: &TriangleMesh, target_faces: usize) -> SimplificationOutcome {
        let (cleaned, cleanup) = clean_mesh(mesh, &self.cleanup);
        let cleaned_vertices = cleaned.vertex_count();
        let cleaned_faces = cleaned.face_count();

        if cleaned_faces <= target_faces {
            info!(faces = cleaned_faces, target = target_faces, "Mesh already within face budget");
            return SimplificationOutcome {
                mesh: cleaned,
                strategy: None,
                cleaned_vertices,
                cleaned_faces,
                cleanup,
            };
        }

        for strategy in &self.strategies {
            match strategy.simplify(&cleaned, target_faces) {
                Ok(result) if !result.is_empty() => {
                    info!(
                        strategy = strategy.name(),
                        faces = result.face_count(),
                        target = target_faces,
                        "Simplification succeeded"
                    );
                    return SimplificationOutcome {
                        mesh: result,
                        strategy: Some(strategy.name().to_string()),
                        cleaned_vertices,
                        cleaned_faces,
                        cleanup,
                    };
                }
                Ok(_) => {
                    warn!(strategy = strategy.name(), "Simplification produced an empty mesh");
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Simplification failed");
                }
            }
        }

        warn!("Every simplification strategy failed, keeping the cleaned mesh");
        SimplificationOutcome {
            mesh: cleaned,
            strategy: None,
            cleaned_vertices,
            cleaned_faces,
            cleanup,
        }
    }
}
