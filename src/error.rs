//! Error types for subdiv-mesh.
//!
//! This module defines all error types used throughout the library.
//!
//! Only usage and precondition problems are reported as errors. Data
//! integrity problems in the control mesh (out-of-range indices, bad
//! winding, non-manifold edges) never fail a commit; they degrade to
//! invalid faces or pinned creases instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::mesh::BufferType;

/// Result type alias using [`SubdivError`].
pub type Result<T> = std::result::Result<T, SubdivError>;

/// Errors that can occur during subdivision mesh operations.
#[derive(Error, Debug)]
pub enum SubdivError {
    /// The owning scene is static and has already been built.
    #[error("static scenes cannot get modified")]
    StaticSceneModified,

    /// Interpolation was requested on a scene created without it.
    #[error("interpolation is not enabled for this scene")]
    InterpolationDisabled,

    /// The mesh has not been committed yet, so no topology exists.
    #[error("mesh topology has not been committed")]
    NotCommitted,

    /// The buffer selector does not name a buffer of this mesh.
    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferType),

    /// The buffer selector names an optional buffer that was never set.
    #[error("buffer {0:?} has not been set")]
    UnsetBuffer(BufferType),

    /// A buffer was given the wrong number of elements.
    #[error("invalid size for buffer {buffer:?}: expected {expected}, got {actual}")]
    InvalidBufferSize {
        /// The buffer being set.
        buffer: BufferType,
        /// Expected element count.
        expected: usize,
        /// Supplied element count.
        actual: usize,
    },

    /// Raw buffer data is misaligned or has a bad stride.
    #[error("invalid layout for buffer {buffer:?}: {reason}")]
    InvalidBufferLayout {
        /// The buffer being set.
        buffer: BufferType,
        /// What is wrong with the layout.
        reason: String,
    },

    /// A face index outside the mesh was queried.
    #[error("face {face} out of range (mesh has {num_faces} faces)")]
    FaceOutOfRange {
        /// The requested face.
        face: usize,
        /// Number of faces in the mesh.
        num_faces: usize,
    },

    /// The patch evaluator cannot handle this face.
    #[error("face {face} with valence {valence} cannot be evaluated")]
    UnsupportedPatch {
        /// The face index.
        face: usize,
        /// The face valence.
        valence: usize,
    },

    /// A face references a vertex that does not exist in the evaluated buffer.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl SubdivError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        SubdivError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Returns `true` for errors caused by calling the API incorrectly,
    /// as opposed to I/O or input file problems.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            SubdivError::StaticSceneModified
                | SubdivError::InterpolationDisabled
                | SubdivError::NotCommitted
                | SubdivError::UnknownBuffer(_)
                | SubdivError::UnsetBuffer(_)
                | SubdivError::InvalidBufferSize { .. }
                | SubdivError::InvalidBufferLayout { .. }
                | SubdivError::FaceOutOfRange { .. }
                | SubdivError::InvalidParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_message() {
        let err = SubdivError::invalid_param("tessellation_rate", -1.0, "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter: tessellation_rate = -1 (must be positive)"
        );
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_buffer_errors_name_the_buffer() {
        let err = SubdivError::UnsetBuffer(BufferType::User(1));
        assert!(err.to_string().contains("User(1)"));

        let io = SubdivError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_usage_error());
    }
}
