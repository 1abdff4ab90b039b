//! Core data structures for dartprep
//!
//! This crate provides the fundamental types shared by every preprocessing job:
//! triangle meshes, axis-aligned bounds, the synthesized floor patch, the
//! normalization transform used before SDF computation, and the error type.

pub mod point;
pub mod mesh;
pub mod bounds;
pub mod floor;
pub mod normalize;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use bounds::*;
pub use floor::*;
pub use normalize::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
