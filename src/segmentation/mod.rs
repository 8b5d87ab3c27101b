// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Segmentation engine - normal clustering, refinement and candidate selection

mod cluster;
mod coherence;
pub mod components;
mod params;
mod refine;
mod segment;
mod selection;

pub use cluster::{ClusteringResult, NormalClusterer, NOISE_LABEL};
pub use coherence::{CoherenceScorer, PlaneFit, SegmentScores};
pub use components::connected_components;
pub use params::ClusteringParameters;
pub use refine::{RecursiveRefiner, RefinementContext, RefinementStats};
pub use segment::Segment;
pub use selection::{
    segment_color, AbortSelector, FractureCandidateSelector, FractureMask, IndexSelector,
    SegmentSelector, SegmentView, SelectionOutcome, SelectionRequest,
};
