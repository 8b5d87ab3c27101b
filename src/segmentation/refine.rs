// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Recursive segment refinement
//!
//! A segment is first split into its connected components. A single
//! component is then kept when it is too small to split, when it is large
//! and reasonably coherent, or when it passes the stricter split checks.
//! Otherwise its faces are re-clustered with tightened parameters and every
//! part is refined again one level deeper.
//!
//! Refinement runs on an explicit LIFO worklist, so output order matches a
//! depth-first recursion and call depth stays constant. Every input face ends
//! up in exactly one output segment.

use log::{debug, trace};
use serde::Serialize;

use super::components::connected_components;
use super::{ClusteringParameters, CoherenceScorer, NormalClusterer, Segment};
use crate::geometry::Mesh;

/// Recursion state carried with every pending segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementContext {
    pub depth: usize,
    /// Clustering radius of the first pass
    pub base_eps: f64,
    /// Core threshold of the first pass
    pub base_min_samples: usize,
}

impl RefinementContext {
    pub fn new(base_eps: f64, base_min_samples: usize) -> Self {
        Self {
            depth: 0,
            base_eps,
            base_min_samples,
        }
    }

    pub fn from_params(params: &ClusteringParameters) -> Self {
        Self::new(params.normal_cluster_eps, params.normal_cluster_min_samples)
    }

    fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

/// Counts of refinement decisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefinementStats {
    pub component_splits: usize,
    pub size_guard_accepts: usize,
    pub dominant_keeps: usize,
    pub standard_accepts: usize,
    pub recluster_splits: usize,
    pub no_progress_accepts: usize,
    pub depth_limited: usize,
    /// Deepest level any segment was examined at
    pub max_depth: usize,
}

impl RefinementStats {
    pub fn merge(&mut self, other: &RefinementStats) {
        self.component_splits += other.component_splits;
        self.size_guard_accepts += other.size_guard_accepts;
        self.dominant_keeps += other.dominant_keeps;
        self.standard_accepts += other.standard_accepts;
        self.recluster_splits += other.recluster_splits;
        self.no_progress_accepts += other.no_progress_accepts;
        self.depth_limited += other.depth_limited;
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

/// What happened to one segment taken off the worklist
enum Step {
    Accept(Segment),
    /// Final parts, emitted in order without further checks
    AcceptAll(Vec<Segment>),
    Split(Vec<Segment>),
}

pub struct RecursiveRefiner<'a> {
    mesh: &'a Mesh,
    params: &'a ClusteringParameters,
    scorer: CoherenceScorer<'a>,
    stats: RefinementStats,
}

impl<'a> RecursiveRefiner<'a> {
    pub fn new(mesh: &'a Mesh, params: &'a ClusteringParameters) -> Self {
        Self {
            mesh,
            params,
            scorer: CoherenceScorer::new(mesh, params),
            stats: RefinementStats::default(),
        }
    }

    pub fn stats(&self) -> &RefinementStats {
        &self.stats
    }

    /// Refine `segment` into coherent, connected parts
    pub fn refine(&mut self, segment: Segment, context: RefinementContext) -> Vec<Segment> {
        let mut output = Vec::new();
        let mut worklist = vec![(segment, context)];

        while let Some((segment, context)) = worklist.pop() {
            if segment.is_empty() {
                continue;
            }
            self.stats.max_depth = self.stats.max_depth.max(context.depth);

            match self.step(segment, context) {
                Step::Accept(segment) => output.push(segment),
                Step::AcceptAll(parts) => output.extend(parts),
                Step::Split(children) => {
                    let deeper = context.deeper();
                    worklist.extend(children.into_iter().rev().map(|child| (child, deeper)));
                }
            }
        }

        output
    }

    fn step(&mut self, segment: Segment, context: RefinementContext) -> Step {
        let mut components = connected_components(self.mesh, segment.faces());

        if context.depth > self.params.refinement_max_recursion_depth {
            // Frozen at this granularity, but never spanning disjoint patches
            self.stats.depth_limited += 1;
            trace!("depth limit reached at depth {} ({} faces)", context.depth, segment.len());
            return Step::AcceptAll(components.into_iter().map(Segment::new).collect());
        }

        if components.len() > 1 {
            self.stats.component_splits += 1;
            trace!(
                "depth {}: split {} faces into {} connected components",
                context.depth,
                segment.len(),
                components.len()
            );
            return Step::Split(components.into_iter().map(Segment::new).collect());
        }

        let segment = components.pop().map_or(segment, Segment::new);
        let size = segment.len();
        let faces = segment.faces();

        let strict_min_samples = self.params.strict_min_samples(context.base_min_samples);
        if size < strict_min_samples * 2 {
            self.stats.size_guard_accepts += 1;
            return Step::Accept(segment);
        }

        let orientation = self.scorer.orientation_badness(faces);
        let planar = self.scorer.planar_badness(faces);

        if size >= self.params.refinement_dominant_keep_min_faces
            && orientation <= self.params.refinement_dominant_keep_pca_badness_thresh
            && planar <= self.params.refinement_dominant_keep_planar_badness_thresh
        {
            self.stats.dominant_keeps += 1;
            debug!(
                "depth {}: kept dominant segment of {size} faces \
                 (orientation {orientation:.4}, planar {planar:.4})",
                context.depth
            );
            return Step::Accept(segment);
        }

        let homogeneous = !self.params.refinement_check_roughness_homogeneity
            || self.scorer.is_roughness_homogeneous(faces);

        if orientation <= self.params.refinement_pca_split_badness_thresh
            && planar <= self.params.refinement_planar_split_badness_thresh
            && homogeneous
        {
            self.stats.standard_accepts += 1;
            trace!(
                "depth {}: {size} faces coherent \
                 (orientation {orientation:.4}, planar {planar:.4})",
                context.depth
            );
            return Step::Accept(segment);
        }

        let clusterer =
            NormalClusterer::new(self.params.strict_eps(context.base_eps), strict_min_samples);
        let result = clusterer.cluster(self.mesh, Some(faces));
        let noise = result.noise();

        let mut children: Vec<Segment> = result.clusters.into_iter().map(Segment::new).collect();
        if !noise.is_empty() {
            children.push(Segment::new(noise));
        }

        if children.len() <= 1 {
            self.stats.no_progress_accepts += 1;
            debug!(
                "depth {}: re-clustering did not split {size} faces \
                 (orientation {orientation:.4}, planar {planar:.4}, homogeneous {homogeneous})",
                context.depth
            );
            return Step::Accept(segment);
        }

        self.stats.recluster_splits += 1;
        debug!(
            "depth {}: re-clustered {size} faces into {} parts \
             (orientation {orientation:.4}, planar {planar:.4}, homogeneous {homogeneous})",
            context.depth,
            children.len()
        );
        Step::Split(children)
    }
}
