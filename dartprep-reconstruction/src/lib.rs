//! # dartprep Reconstruction
//!
//! Surface extraction and distance fields.
//!
//! This crate provides the volumetric pieces of the preprocessing jobs: a
//! scalar grid with marching-cubes iso-surface extraction, surface
//! voxelization, connected-component analysis, and the signed-distance
//! backends used by SDF generation.

pub mod marching_cubes;
pub mod components;
pub mod voxelize;
pub mod sdf;

// Re-export commonly used items
pub use marching_cubes::*;
pub use components::*;
pub use voxelize::*;
pub use sdf::*;
