// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fracture-surface extraction pipeline
//!
//! ```text
//! Mesh -> initial normal clustering -> refinement -> size filter
//!      -> external selection -> fracture mask -> sub-mesh
//! Mesh -> initial normal clustering -> automatic heuristics -> fracture mask -> sub-mesh
//! ```

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::Result;
use crate::geometry::Mesh;
use crate::segmentation::{
    segment_color, ClusteringParameters, ClusteringResult, CoherenceScorer,
    FractureCandidateSelector, FractureMask, NormalClusterer, RecursiveRefiner, RefinementContext,
    RefinementStats, Segment, SegmentScores, SegmentSelector, SegmentView, SelectionOutcome,
    SelectionRequest,
};

/// Refined segments of one mesh
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Whole-mesh clustering the refinement started from
    pub initial: ClusteringResult,
    /// Segments offered for selection, in refinement order
    pub segments: Vec<Segment>,
    /// Refined segments removed by the final size filter
    pub dropped: Vec<Segment>,
    pub stats: RefinementStats,
}

impl Segmentation {
    /// Faces covered by the dropped segments
    pub fn dropped_faces(&self) -> usize {
        self.dropped.iter().map(Segment::len).sum()
    }

    /// Offered segments with their display colors
    pub fn views(&self) -> Vec<SegmentView<'_>> {
        self.segments
            .iter()
            .enumerate()
            .map(|(index, segment)| SegmentView {
                index,
                faces: segment.faces(),
                color: segment_color(index),
            })
            .collect()
    }

    /// Per-segment report rows
    pub fn summaries(&self, mesh: &Mesh, params: &ClusteringParameters) -> Vec<SegmentSummary> {
        let scorer = CoherenceScorer::new(mesh, params);
        self.segments
            .iter()
            .enumerate()
            .map(|(index, segment)| SegmentSummary {
                index,
                color: segment_color(index),
                area: segment.area(mesh),
                scores: scorer.scores(segment.faces()),
                faces: segment.faces().to_vec(),
            })
            .collect()
    }
}

/// Report row for one offered segment
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub index: usize,
    pub color: [f32; 3],
    pub area: f64,
    pub scores: SegmentScores,
    pub faces: Vec<usize>,
}

/// Extracted fracture surface
#[derive(Debug, Clone)]
pub struct FractureSurface {
    /// Fracture flag per face of the input mesh
    pub mask: FractureMask,
    /// Selected faces as a cleaned, standalone mesh
    pub mesh: Mesh,
}

/// Runs segmentation and extraction with one validated parameter set
#[derive(Debug, Clone)]
pub struct FractureExtractor {
    params: ClusteringParameters,
}

impl FractureExtractor {
    pub fn new(params: ClusteringParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ClusteringParameters {
        &self.params
    }

    /// Cluster, refine and size-filter the faces of `mesh`.
    ///
    /// Before filtering, the refined segments partition all faces; faces
    /// left out of every initial cluster are carried as one more segment.
    pub fn segment(&self, mesh: &Mesh) -> Result<Segmentation> {
        let params = &self.params;
        let total = mesh.triangle_count();
        let initial = self.cluster_initial(mesh)?;
        let noise = initial.noise();

        let mut refiner = RecursiveRefiner::new(mesh, params);
        let context = RefinementContext::from_params(params);
        let mut refined = Vec::new();

        if !noise.is_empty() {
            let noise = Segment::new(noise);
            if params.segment_refinement_enabled {
                refined.extend(refiner.refine(noise, context));
            } else {
                refined.push(noise);
            }
        }

        for cluster in &initial.clusters {
            let segment = Segment::new(cluster.clone());
            if params.should_refine(segment.len(), total) {
                refined.extend(refiner.refine(segment, context));
            } else {
                refined.push(segment);
            }
        }

        debug_assert_eq!(refined.iter().map(Segment::len).sum::<usize>(), total);

        let (segments, dropped): (Vec<Segment>, Vec<Segment>) = refined
            .into_iter()
            .partition(|s| s.len() >= params.refinement_min_final_segment_size);

        let stats = *refiner.stats();
        info!(
            "refinement finished: {} segments, {} dropped, max depth {}",
            segments.len(),
            dropped.len(),
            stats.max_depth
        );

        Ok(Segmentation {
            initial,
            segments,
            dropped,
            stats,
        })
    }

    fn cluster_initial(&self, mesh: &Mesh) -> Result<ClusteringResult> {
        mesh.validate()?;
        let initial = NormalClusterer::from_params(&self.params).cluster(mesh, None);
        info!(
            "initial clustering of {} faces: {} clusters, {} noise faces",
            mesh.triangle_count(),
            initial.cluster_count(),
            initial.noise().len()
        );
        Ok(initial)
    }

    /// Fracture candidates of the automatic heuristics
    pub fn candidates(&self, mesh: &Mesh, segmentation: &Segmentation) -> FractureMask {
        FractureCandidateSelector::new(mesh, &self.params)
            .automatic_candidates(&segmentation.initial)
    }

    /// Turn a selection into a fracture mask.
    ///
    /// `None` when the selection was aborted. An unresolved or empty selection
    /// falls back to the boundary heuristic, which may itself be empty.
    pub fn resolve_selection(
        &self,
        mesh: &Mesh,
        segmentation: &Segmentation,
        outcome: &SelectionOutcome,
    ) -> Option<FractureMask> {
        let candidates = FractureCandidateSelector::new(mesh, &self.params);

        let mask = match outcome {
            SelectionOutcome::Aborted => {
                info!("selection aborted, no fracture surface");
                return None;
            }
            SelectionOutcome::Unresolved => FractureMask::new(mesh.triangle_count()),
            SelectionOutcome::Confirmed(indices) => {
                candidates.mask_from_selection(&segmentation.segments, indices)
            }
        };

        if !mask.is_empty() {
            return Some(mask);
        }

        let fallback = candidates.boundary_candidates();
        info!("no segment selected, using {} boundary faces", fallback.count());
        Some(fallback)
    }

    /// Extract the fracture surface chosen by `selector`.
    ///
    /// `Ok(None)` when no face has a usable normal, when nothing is selected
    /// and the boundary fallback is empty, when selection is aborted, or when
    /// the selected faces are all degenerate.
    pub fn extract_with(
        &self,
        mesh: &Mesh,
        selector: &dyn SegmentSelector,
    ) -> Result<Option<FractureSurface>> {
        let segmentation = self.segment(mesh)?;
        if segmentation.initial.cluster_count() == 0 {
            warn!("every face normal is degenerate, nothing to segment");
            return Ok(None);
        }
        let candidates = self.candidates(mesh, &segmentation);

        let outcome = if segmentation.segments.is_empty() {
            warn!("no segments survived the size filter");
            SelectionOutcome::Unresolved
        } else {
            selector.select(&SelectionRequest {
                mesh,
                segments: segmentation.views(),
                candidates: &candidates,
            })
        };
        debug!("selection finished: {outcome:?}");

        let Some(mask) = self.resolve_selection(mesh, &segmentation, &outcome) else {
            return Ok(None);
        };
        Ok(Self::build_surface(mesh, mask))
    }

    /// Extract the faces flagged by the automatic heuristics.
    ///
    /// The mask is the curvature candidates OR'd with the boundary
    /// candidates, or the boundary candidates alone when normal-based
    /// segmentation is disabled. An empty mask falls back to the boundary
    /// heuristic.
    pub fn extract(&self, mesh: &Mesh) -> Result<Option<FractureSurface>> {
        let initial = self.cluster_initial(mesh)?;
        if initial.cluster_count() == 0 {
            warn!("every face normal is degenerate, nothing to segment");
            return Ok(None);
        }

        let selector = FractureCandidateSelector::new(mesh, &self.params);
        let mut mask = selector.automatic_candidates(&initial);
        if mask.is_empty() {
            mask = selector.boundary_candidates();
            info!("no automatic candidates, using {} boundary faces", mask.count());
        }
        Ok(Self::build_surface(mesh, mask))
    }

    fn build_surface(mesh: &Mesh, mask: FractureMask) -> Option<FractureSurface> {
        if mask.is_empty() {
            info!("no fracture faces identified");
            return None;
        }

        let surface = mesh.submesh(mask.as_slice());
        if surface.triangle_count() == 0 {
            warn!("{} selected faces left no triangles after cleanup", mask.count());
            return None;
        }

        info!(
            "extracted fracture surface: {} vertices, {} triangles",
            surface.vertex_count(),
            surface.triangle_count()
        );
        Some(FractureSurface {
            mask,
            mesh: surface,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SegmentationError;
    use crate::geometry::Primitive;
    use crate::segmentation::{AbortSelector, IndexSelector};
    use nalgebra::{Point3, Vector3};

    fn cube_params() -> ClusteringParameters {
        ClusteringParameters {
            normal_cluster_eps: 0.2,
            normal_cluster_min_samples: 3,
            segment_refinement_enabled: false,
            refinement_min_final_segment_size: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let params = ClusteringParameters {
            normal_cluster_eps: -1.0,
            ..Default::default()
        };
        assert!(FractureExtractor::new(params).is_err());
    }

    #[test]
    fn test_empty_mesh_is_an_error() {
        let extractor = FractureExtractor::new(ClusteringParameters::default()).unwrap();
        let err = extractor.extract(&Mesh::new()).unwrap_err();
        assert!(matches!(err, SegmentationError::EmptyMesh { .. }));
    }

    #[test]
    fn test_cube_segmentation() {
        let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let extractor = FractureExtractor::new(cube_params()).unwrap();
        let segmentation = extractor.segment(&cube).unwrap();

        assert_eq!(segmentation.initial.cluster_count(), 6);
        assert_eq!(segmentation.segments.len(), 6);
        assert!(segmentation.dropped.is_empty());

        let summaries = segmentation.summaries(&cube, extractor.params());
        assert_eq!(summaries.len(), 6);
        assert!(summaries.iter().all(|s| s.scores.orientation_badness == 0.0));
    }

    #[test]
    fn test_selected_segment_becomes_surface() {
        let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let extractor = FractureExtractor::new(cube_params()).unwrap();

        let surface = extractor
            .extract_with(&cube, &IndexSelector::new(vec![0]))
            .unwrap()
            .unwrap();
        assert_eq!(surface.mask.selected_faces(), vec![0, 1]);
        assert_eq!(surface.mesh.triangle_count(), 2);
        assert_eq!(surface.mesh.vertex_count(), 4);
    }

    #[test]
    fn test_all_degenerate_faces_yield_nothing() {
        let mesh = Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            &[[0, 1, 2], [2, 1, 0]],
        );
        let extractor = FractureExtractor::new(cube_params()).unwrap();
        assert!(extractor.extract(&mesh).unwrap().is_none());
    }

    #[test]
    fn test_automatic_extraction_uses_heuristic_mask() {
        let open = Primitive::open_box(Vector3::new(1.0, 1.0, 1.0)).to_mesh();
        let extractor = FractureExtractor::new(cube_params()).unwrap();
        let segmentation = extractor.segment(&open).unwrap();
        let expected = extractor.candidates(&open, &segmentation);

        let surface = extractor.extract(&open).unwrap().unwrap();
        assert_eq!(surface.mask, expected);
        assert_eq!(surface.mesh.triangle_count(), expected.count());
    }

    #[test]
    fn test_abort_and_fallback() {
        let open = Primitive::open_box(Vector3::new(1.0, 1.0, 1.0)).to_mesh();
        let extractor = FractureExtractor::new(cube_params()).unwrap();

        assert!(extractor.extract_with(&open, &AbortSelector).unwrap().is_none());

        // Nothing selected: the rim triangles are used instead
        let surface = extractor
            .extract_with(&open, &IndexSelector::new(Vec::new()))
            .unwrap()
            .unwrap();
        assert_eq!(surface.mask.count(), 4);

        // A closed mesh has no fallback
        let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        assert!(extractor
            .extract_with(&cube, &IndexSelector::new(Vec::new()))
            .unwrap()
            .is_none());
    }
}
