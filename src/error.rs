// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for fracture-surface segmentation.
//!
//! Only structurally invalid input is reported as an error. Numerically
//! degenerate geometry (zero-area faces, normals cancelling out, subsets too
//! small to cluster) is absorbed where it occurs and turned into a
//! conservative score, so it never shows up here.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`SegmentationError`].
pub type Result<T> = std::result::Result<T, SegmentationError>;

/// Errors that can occur while segmenting a fragment mesh.
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// The mesh has no vertices or no faces.
    #[error("mesh is empty ({vertices} vertices, {faces} faces)")]
    EmptyMesh {
        /// Number of vertices.
        vertices: usize,
        /// Number of faces.
        faces: usize,
    },

    /// A face references a vertex that does not exist.
    #[error("face {face} references invalid vertex index {vertex} (mesh has {vertex_count} vertices)")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A clustering parameter is outside its valid domain.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter key.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parameter file could not be parsed or written.
    #[error("failed to process parameter file {path}: {message}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl SegmentationError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        SegmentationError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// True for errors caused by the input mesh itself.
    pub fn is_invalid_mesh(&self) -> bool {
        matches!(
            self,
            SegmentationError::EmptyMesh { .. } | SegmentationError::InvalidVertexIndex { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SegmentationError::invalid_param("normal_cluster_eps", -0.5, "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid parameter: normal_cluster_eps = -0.5 (must be positive)"
        );
        assert!(!err.is_invalid_mesh());

        let err = SegmentationError::InvalidVertexIndex {
            face: 3,
            vertex: 42,
            vertex_count: 8,
        };
        assert!(err.is_invalid_mesh());
        assert!(err.to_string().contains("vertex index 42"));
    }
}
