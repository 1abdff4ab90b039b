//! Job configuration
//!
//! Every tunable constant of the jobs lives here as a default, so the
//! algorithms themselves never hard-code them.

use dartprep_simplification::{CleanupConfig, SimplificationChain};

/// Mesh-simplification job parameters
#[derive(Debug, Clone)]
pub struct SimplifyConfig {
    /// Face budget of the output mesh
    pub target_faces: usize,
    /// Voxel clustering pitch is the mesh's largest extent divided by this
    pub voxel_pitch_divisor: f64,
    pub cleanup: CleanupConfig,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            target_faces: 200_000,
            voxel_pitch_divisor: 100.0,
            cleanup: CleanupConfig::default(),
        }
    }
}

impl SimplifyConfig {
    pub fn with_target_faces(mut self, target_faces: usize) -> Self {
        self.target_faces = target_faces;
        self
    }

    pub fn with_voxel_pitch_divisor(mut self, divisor: f64) -> Self {
        self.voxel_pitch_divisor = divisor;
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupConfig) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_merge_tolerance(mut self, tolerance: f64) -> Self {
        self.cleanup.merge_tolerance = tolerance;
        self
    }

    pub fn with_area_epsilon(mut self, epsilon: f64) -> Self {
        self.cleanup.area_epsilon = epsilon;
        self
    }

    /// Quadric decimation, then voxel clustering, then the cleaned input
    pub fn chain(&self) -> SimplificationChain {
        SimplificationChain::standard(self.cleanup.clone(), self.voxel_pitch_divisor)
    }
}

/// Floor-synthesis job parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FloorConfig {
    /// How far the floor extends past the scene footprint on each side
    pub margin: f64,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self { margin: 0.5 }
    }
}

impl FloorConfig {
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }
}

/// SDF-generation job parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SdfConfig {
    /// Samples per axis of the cubic grid
    pub size: usize,
    /// Half-width of the normalized cube the longest axis is mapped onto
    pub mesh_scale: f64,
}

impl Default for SdfConfig {
    fn default() -> Self {
        Self {
            size: 256,
            mesh_scale: 0.8,
        }
    }
}

impl SdfConfig {
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_mesh_scale(mut self, mesh_scale: f64) -> Self {
        self.mesh_scale = mesh_scale;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let simplify = SimplifyConfig::default();
        assert_eq!(simplify.target_faces, 200_000);
        assert_eq!(simplify.voxel_pitch_divisor, 100.0);
        assert_eq!(FloorConfig::default().margin, 0.5);

        let sdf = SdfConfig::default();
        assert_eq!(sdf.size, 256);
        assert_eq!(sdf.mesh_scale, 0.8);
    }

    #[test]
    fn test_builders() {
        let config = SdfConfig::default().with_size(64).with_mesh_scale(0.5);
        assert_eq!(config, SdfConfig { size: 64, mesh_scale: 0.5 });
        assert_eq!(FloorConfig::default().with_margin(1.0).margin, 1.0);
    }

    #[test]
    fn test_cleanup_builders() {
        let config = SimplifyConfig::default()
            .with_merge_tolerance(1e-4)
            .with_area_epsilon(1e-9);
        assert_eq!(
            config.cleanup,
            CleanupConfig::default().with_merge_tolerance(1e-4).with_area_epsilon(1e-9)
        );
        assert_eq!(SimplifyConfig::default().cleanup, CleanupConfig::default());
    }

    #[test]
    fn test_chain_order() {
        let chain = SimplifyConfig::default().chain();
        assert_eq!(
            chain.strategy_names(),
            vec!["quadric_decimation", "voxel_clustering", "keep_cleaned"]
        );
    }
}
