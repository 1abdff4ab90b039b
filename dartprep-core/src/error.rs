//! Error types for dartprep

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dartprep operations
///
/// `Algorithm` is what a simplification strategy reports when it gives up;
/// the fallback chain handles it by trying the next strategy.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("SDF computation failed for {} (grid size {size}): {reason}", .input.display())]
    SdfComputation {
        input: PathBuf,
        size: usize,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build an I/O error tagged with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for dartprep operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = Error::io(
            "/missing/scene.obj",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let message = err.to_string();
        assert!(message.contains("/missing/scene.obj"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_sdf_error_carries_context() {
        let err = Error::SdfComputation {
            input: PathBuf::from("scene.obj"),
            size: 256,
            reason: "no surface".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("scene.obj"));
        assert!(message.contains("256"));
    }
}
