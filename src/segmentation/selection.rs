// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Fracture candidate selection
//!
//! Refined segments are offered to a [`SegmentSelector`], which answers with
//! a [`SelectionOutcome`]. Two face-level heuristics back automatic
//! extraction and the fallback path:
//! * curvature: initial clusters whose normals spread more than
//!   `roughness_threshold` around their mean direction,
//! * boundary: faces owning at least `min_boundary_edges_for_fracture_face`
//!   boundary edges.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{ClusteringParameters, ClusteringResult, CoherenceScorer, Segment};
use crate::geometry::Mesh;

/// Per-face flag marking the fracture surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractureMask {
    faces: Vec<bool>,
}

impl FractureMask {
    /// All-false mask over `face_count` faces
    pub fn new(face_count: usize) -> Self {
        Self {
            faces: vec![false; face_count],
        }
    }

    /// Mask with `selected` faces set; out-of-range indices are ignored
    pub fn from_faces(face_count: usize, selected: impl IntoIterator<Item = usize>) -> Self {
        let mut mask = Self::new(face_count);
        for face in selected {
            mask.set(face);
        }
        mask
    }

    pub fn set(&mut self, face: usize) {
        if let Some(flag) = self.faces.get_mut(face) {
            *flag = true;
        }
    }

    pub fn get(&self, face: usize) -> bool {
        self.faces.get(face).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Number of marked faces
    pub fn count(&self) -> usize {
        self.faces.iter().filter(|&&f| f).count()
    }

    /// True when no face is marked
    pub fn is_empty(&self) -> bool {
        !self.faces.iter().any(|&f| f)
    }

    pub fn selected_faces(&self) -> Vec<usize> {
        self.faces
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect()
    }

    /// Mark every face marked in `other`
    pub fn union_with(&mut self, other: &FractureMask) {
        for (flag, &o) in self.faces.iter_mut().zip(&other.faces) {
            *flag |= o;
        }
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.faces
    }
}

/// Outcome of offering segments for selection.
///
/// Starts `Unresolved` and resolves once, to `Confirmed` or `Aborted`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionOutcome {
    #[default]
    Unresolved,
    /// Indices into the offered segment list
    Confirmed(Vec<usize>),
    /// No segment is fracture surface; no fallback applies
    Aborted,
}

impl SelectionOutcome {
    /// Resolve to `Confirmed`; already resolved outcomes are kept
    pub fn confirm(self, indices: Vec<usize>) -> Self {
        match self {
            Self::Unresolved => Self::Confirmed(indices),
            resolved => resolved,
        }
    }

    /// Resolve to `Aborted`; already resolved outcomes are kept
    pub fn abort(self) -> Self {
        match self {
            Self::Unresolved => Self::Aborted,
            resolved => resolved,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    pub fn selected(&self) -> &[usize] {
        match self {
            Self::Confirmed(indices) => indices,
            _ => &[],
        }
    }
}

/// One segment as shown to a selector
#[derive(Debug, Clone, Copy)]
pub struct SegmentView<'a> {
    pub index: usize,
    pub faces: &'a [usize],
    /// Display color, RGB in [0, 1]
    pub color: [f32; 3],
}

/// Everything a selector gets to decide on
#[derive(Debug, Clone)]
pub struct SelectionRequest<'a> {
    pub mesh: &'a Mesh,
    pub segments: Vec<SegmentView<'a>>,
    /// Faces flagged by the automatic heuristics
    pub candidates: &'a FractureMask,
}

/// Decides which offered segments are fracture surface
pub trait SegmentSelector {
    fn select(&self, request: &SelectionRequest<'_>) -> SelectionOutcome;
}

impl<F> SegmentSelector for F
where
    F: Fn(&SelectionRequest<'_>) -> SelectionOutcome,
{
    fn select(&self, request: &SelectionRequest<'_>) -> SelectionOutcome {
        self(request)
    }
}

/// Selects a fixed list of segment indices
#[derive(Debug, Clone, Default)]
pub struct IndexSelector {
    indices: Vec<usize>,
}

impl IndexSelector {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }
}

impl SegmentSelector for IndexSelector {
    fn select(&self, request: &SelectionRequest<'_>) -> SelectionOutcome {
        let valid = self
            .indices
            .iter()
            .copied()
            .filter(|&i| i < request.segments.len())
            .collect();
        SelectionOutcome::Unresolved.confirm(valid)
    }
}

/// Declines every segment
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortSelector;

impl SegmentSelector for AbortSelector {
    fn select(&self, _request: &SelectionRequest<'_>) -> SelectionOutcome {
        SelectionOutcome::Unresolved.abort()
    }
}

/// Qualitative palette (tab10)
const PALETTE: [[f32; 3]; 10] = [
    [0.122, 0.467, 0.706],
    [1.000, 0.498, 0.055],
    [0.173, 0.627, 0.173],
    [0.839, 0.153, 0.157],
    [0.580, 0.404, 0.741],
    [0.549, 0.337, 0.294],
    [0.890, 0.467, 0.761],
    [0.498, 0.498, 0.498],
    [0.737, 0.741, 0.133],
    [0.090, 0.745, 0.812],
];

/// Display color of segment `index`: palette colors first, then lighter and
/// darker variants of them
pub fn segment_color(index: usize) -> [f32; 3] {
    let base = PALETTE[index % PALETTE.len()];
    match (index / PALETTE.len()) % 3 {
        0 => base,
        1 => base.map(|c| (c * 1.3 + 0.1).min(1.0)),
        _ => base.map(|c| c * 0.7),
    }
}

/// Builds face masks from heuristics and selections
#[derive(Debug, Clone, Copy)]
pub struct FractureCandidateSelector<'a> {
    mesh: &'a Mesh,
    params: &'a ClusteringParameters,
}

impl<'a> FractureCandidateSelector<'a> {
    pub fn new(mesh: &'a Mesh, params: &'a ClusteringParameters) -> Self {
        Self { mesh, params }
    }

    /// Faces of initial clusters rougher than `roughness_threshold`, or of
    /// the roughest cluster when none is. Empty only without clusters.
    pub fn curvature_candidates(&self, initial: &ClusteringResult) -> FractureMask {
        let scorer = CoherenceScorer::new(self.mesh, self.params);
        let mut mask = FractureMask::new(self.mesh.triangle_count());

        let curvatures: Vec<f64> = initial
            .clusters
            .iter()
            .map(|cluster| scorer.cluster_curvature(cluster))
            .collect();

        for (cluster, &curvature) in initial.clusters.iter().zip(&curvatures) {
            if curvature > self.params.roughness_threshold {
                cluster.iter().for_each(|&f| mask.set(f));
            }
        }

        if mask.is_empty() {
            let roughest = curvatures
                .iter()
                .enumerate()
                .fold(None, |best: Option<(usize, f64)>, (i, &c)| match best {
                    Some((_, b)) if b >= c => best,
                    _ => Some((i, c)),
                });
            if let Some((i, curvature)) = roughest {
                debug!(
                    "no cluster above roughness threshold, using cluster {i} \
                     (curvature {curvature:.4})"
                );
                initial.clusters[i].iter().for_each(|&f| mask.set(f));
            }
        }

        mask
    }

    /// Faces owning enough boundary edges; all false on a closed mesh
    pub fn boundary_candidates(&self) -> FractureMask {
        let adjacency = self.mesh.adjacency();
        let face_count = self.mesh.triangle_count();
        if adjacency.is_watertight() {
            return FractureMask::new(face_count);
        }

        let min_edges = self.params.min_boundary_edges_for_fracture_face;
        FractureMask::from_faces(
            face_count,
            (0..face_count).filter(|&f| adjacency.face_boundary_edge_count(f) >= min_edges),
        )
    }

    /// Combined automatic heuristic
    pub fn automatic_candidates(&self, initial: &ClusteringResult) -> FractureMask {
        if !self.params.use_normal_based_segmentation {
            return self.boundary_candidates();
        }

        let mut mask = self.curvature_candidates(initial);
        if self.params.use_boundary_edge_detection {
            mask.union_with(&self.boundary_candidates());
        }
        mask
    }

    /// Mark the faces of the selected segments; unknown indices are ignored
    pub fn mask_from_selection(&self, segments: &[Segment], selected: &[usize]) -> FractureMask {
        let mut mask = FractureMask::new(self.mesh.triangle_count());
        for segment in selected.iter().filter_map(|&i| segments.get(i)) {
            segment.faces().iter().for_each(|&f| mask.set(f));
        }
        mask
    }
}
