// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fracsurf Segmentation Kernel
//!
//! Segments a triangle mesh of a broken fragment into coherent surface
//! patches by face-normal clustering and recursive refinement, then extracts
//! the patches that form the fracture surface as a standalone mesh.

pub mod cli;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod io;
pub mod segmentation;
pub mod utils;

pub use error::{Result, SegmentationError};
pub use extract::{FractureExtractor, FractureSurface, SegmentSummary, Segmentation};
pub use geometry::{Mesh, MeshAdjacency, Primitive, Triangle};
pub use io::{export_stl, import_stl};
pub use segmentation::{
    ClusteringParameters, ClusteringResult, CoherenceScorer, FractureCandidateSelector,
    FractureMask, NormalClusterer, RecursiveRefiner, Segment, SegmentSelector, SelectionOutcome,
};

/// Extract the faces flagged by the automatic fracture heuristics of `mesh`.
///
/// Returns `Ok(None)` when no fracture faces are identified. Structurally
/// invalid meshes and parameters are errors.
pub fn extract_fracture_surface(
    mesh: &Mesh,
    params: &ClusteringParameters,
) -> Result<Option<FractureSurface>> {
    FractureExtractor::new(params.clone())?.extract(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_open_box_extraction() {
        let open = Primitive::open_box(Vector3::new(2.0, 2.0, 2.0)).to_mesh();
        let params = ClusteringParameters {
            normal_cluster_eps: 0.2,
            normal_cluster_min_samples: 2,
            refinement_min_final_segment_size: 1,
            ..Default::default()
        };

        let surface = extract_fracture_surface(&open, &params).unwrap().unwrap();
        assert_eq!(surface.mask.len(), open.triangle_count());
        assert!(surface.mesh.triangle_count() > 0);
        assert_eq!(surface.mesh.triangle_count(), surface.mask.count());
    }
}
