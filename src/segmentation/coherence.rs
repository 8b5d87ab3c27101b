// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric coherence scores for face subsets
//!
//! Badness scores are 0 for a perfectly flat patch and grow as the patch
//! gets less coherent. Subsets smaller than the configured check size are
//! never judged and score as perfectly coherent.

use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::ClusteringParameters;
use crate::geometry::{BoundingBox, Mesh};
use crate::utils::math::{angle_between, mean, std_dev, try_unit, DEGENERATE_NORM};

/// Mean normals shorter than this are treated as cancelled out
const CANCELLED_NORMAL: f64 = 1e-9;
/// Extents and normalizers are never allowed below this
const MIN_SCALE: f64 = 1e-6;

/// Result of fitting one plane through a face subset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFit {
    /// Mean face centroid
    pub point: Point3<f64>,
    /// Normalized mean face normal
    pub normal: Vector3<f64>,
    /// Mean absolute centroid distance to the plane
    pub mean_distance: f64,
    /// Mean angle between face normals and the plane normal, in degrees
    pub mean_angle_deg: f64,
    /// Largest per-axis spread of the face centroids
    pub extent: f64,
}

/// All scores of one segment, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentScores {
    pub faces: usize,
    pub orientation_badness: f64,
    pub planar_badness: f64,
    pub roughness_homogeneous: bool,
    pub curvature: f64,
}

/// Scores face subsets of one mesh under one parameter set
#[derive(Debug, Clone, Copy)]
pub struct CoherenceScorer<'a> {
    mesh: &'a Mesh,
    params: &'a ClusteringParameters,
}

impl<'a> CoherenceScorer<'a> {
    pub fn new(mesh: &'a Mesh, params: &'a ClusteringParameters) -> Self {
        Self { mesh, params }
    }

    fn below_check_size(&self, faces: &[usize]) -> bool {
        faces.len() < self.params.refinement_min_faces_for_coherency_check
    }

    /// Unit normals of `faces`, skipping degenerate ones
    fn unit_normals(&self, faces: &[usize]) -> Vec<Vector3<f64>> {
        let normals = self.mesh.face_normals();
        faces
            .iter()
            .filter_map(|&f| try_unit(&normals[f]))
            .collect()
    }

    /// Share of the normal spread carried by the dominant direction.
    ///
    /// Largest eigenvalue over the trace of the orientation tensor
    /// `(1/n) * sum(n * n^T)`. `None` when there are too few usable normals.
    fn dominant_direction_ratio(&self, faces: &[usize]) -> Option<f64> {
        if self.below_check_size(faces) {
            return None;
        }
        let normals = self.unit_normals(faces);
        let min_faces = self.params.refinement_min_faces_for_coherency_check;
        if normals.len() < min_faces || normals.is_empty() {
            return None;
        }

        let tensor = normals
            .iter()
            .fold(Matrix3::zeros(), |acc, n| acc + n * n.transpose())
            / normals.len() as f64;
        let trace = tensor.trace();
        if trace <= DEGENERATE_NORM {
            return None;
        }

        let eigen = tensor.symmetric_eigen();
        Some((eigen.eigenvalues.max() / trace).clamp(0.0, 1.0))
    }

    /// `1 - dominant share` of the normal spread; 0 for identical normals,
    /// 2/3 for normals split evenly over three orthogonal directions
    pub fn orientation_badness(&self, faces: &[usize]) -> f64 {
        self.dominant_direction_ratio(faces)
            .map_or(0.0, |ratio| 1.0 - ratio)
    }

    /// Fit a plane through the centroids, `None` if the normals cancel out
    pub fn plane_fit(&self, faces: &[usize]) -> Option<PlaneFit> {
        if faces.is_empty() {
            return None;
        }
        let normals = self.mesh.face_normals();
        let centroids = self.mesh.face_centroids();
        let n = faces.len() as f64;

        let normal_sum = faces.iter().fold(Vector3::zeros(), |acc, &f| acc + normals[f]);
        let mean_normal = normal_sum / n;
        if mean_normal.norm() < CANCELLED_NORMAL {
            return None;
        }
        let normal = mean_normal.normalize();

        let point = Point3::from(
            faces
                .iter()
                .fold(Vector3::zeros(), |acc, &f| acc + centroids[f].coords)
                / n,
        );

        let distances: Vec<f64> = faces
            .iter()
            .map(|&f| (centroids[f] - point).dot(&normal).abs())
            .collect();
        let angles: Vec<f64> = self
            .unit_normals(faces)
            .iter()
            .map(|face_normal| angle_between(face_normal, &normal).to_degrees())
            .collect();

        let extent = if faces.len() > 1 {
            BoundingBox::from_points(faces.iter().map(|&f| &centroids[f])).max_extent()
        } else {
            1.0
        };

        Some(PlaneFit {
            point,
            normal,
            mean_distance: mean(&distances),
            mean_angle_deg: mean(&angles),
            extent,
        })
    }

    /// Normalized plane-fit deviation: distance over `extent * factor` plus
    /// angle over the degree threshold. Unbounded above.
    pub fn planar_badness(&self, faces: &[usize]) -> f64 {
        if self.below_check_size(faces) {
            return 0.0;
        }
        let Some(fit) = self.plane_fit(faces) else {
            return self.params.refinement_planar_split_badness_thresh + 1.0;
        };

        let extent = if fit.extent < MIN_SCALE { 1.0 } else { fit.extent };
        let dist_norm =
            (extent * self.params.refinement_coherency_plane_fit_dist_dev_factor).max(MIN_SCALE);
        let angle_norm = self
            .params
            .refinement_coherency_plane_fit_normal_angle_dev_deg
            .max(MIN_SCALE);

        fit.mean_distance / dist_norm + fit.mean_angle_deg / angle_norm
    }

    /// Boolean orientation check: dominant share at least the ratio threshold
    pub fn is_orientation_coherent(&self, faces: &[usize]) -> bool {
        self.dominant_direction_ratio(faces).map_or(true, |ratio| {
            ratio >= self.params.refinement_coherency_normal_pca_ratio_threshold
        })
    }

    /// Boolean plane check on raw deviations; cancelled normals pass
    pub fn is_planar_by_fit(&self, faces: &[usize]) -> bool {
        if self.below_check_size(faces) {
            return true;
        }
        let Some(fit) = self.plane_fit(faces) else {
            return true;
        };
        fit.mean_distance < fit.extent * self.params.refinement_coherency_plane_fit_dist_dev_factor
            && fit.mean_angle_deg < self.params.refinement_coherency_plane_fit_normal_angle_dev_deg
    }

    /// Local roughness per face: spread of the angles (radians) to at most
    /// `roughness_neighbor_k` mesh neighbors. One neighbor gives that angle,
    /// none gives 0.
    pub fn per_face_roughness(&self, faces: &[usize]) -> Vec<f64> {
        let normals = self.mesh.face_normals();
        let adjacency = self.mesh.adjacency();
        let k = self.params.roughness_neighbor_k;

        faces
            .iter()
            .map(|&face| {
                let Some(normal) = try_unit(&normals[face]) else {
                    return 0.0;
                };
                let angles: Vec<f64> = adjacency
                    .face_neighbors(face)
                    .iter()
                    .take(k)
                    .filter_map(|&nb| try_unit(&normals[nb]))
                    .map(|nb| angle_between(&normal, &nb))
                    .collect();
                match angles.as_slice() {
                    [] => 0.0,
                    [single] => *single,
                    many => std_dev(many),
                }
            })
            .collect()
    }

    /// Whether local roughness is uniform across the subset
    pub fn is_roughness_homogeneous(&self, faces: &[usize]) -> bool {
        if faces.len() < self.params.refinement_min_faces_for_roughness_check {
            return true;
        }
        let roughness = self.per_face_roughness(faces);
        if roughness.len() <= 1 {
            return true;
        }
        std_dev(&roughness) < self.params.refinement_roughness_std_dev_threshold
    }

    /// Curvature proxy of a cluster: spread of the angles (radians) between
    /// member normals and their mean direction
    pub fn cluster_curvature(&self, faces: &[usize]) -> f64 {
        let normals = self.unit_normals(faces);
        if normals.is_empty() {
            return 0.0;
        }
        let sum = normals.iter().fold(Vector3::zeros(), |acc, n| acc + n);
        let mean_direction = try_unit(&sum).unwrap_or(sum);

        let deviations: Vec<f64> = normals
            .iter()
            .map(|n| angle_between(n, &mean_direction))
            .collect();
        std_dev(&deviations)
    }

    pub fn scores(&self, faces: &[usize]) -> SegmentScores {
        SegmentScores {
            faces: faces.len(),
            orientation_badness: self.orientation_badness(faces),
            planar_badness: self.planar_badness(faces),
            roughness_homogeneous: self.is_roughness_homogeneous(faces),
            curvature: self.cluster_curvature(faces),
        }
    }
}
