// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Clustering and refinement parameters
//!
//! Parameter files use the flat key names below and may be written as JSON or
//! TOML. Missing keys take their defaults; unknown keys are ignored.

use crate::error::{Result, SegmentationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds that drive clustering, refinement and candidate selection.
///
/// One value is used unchanged for a whole extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringParameters {
    /// Initial density-clustering radius between unit normals
    pub normal_cluster_eps: f64,
    /// Initial density-clustering core-point threshold
    pub normal_cluster_min_samples: usize,
    /// Curvature above which an initial cluster is a fracture candidate
    pub roughness_threshold: f64,
    /// Cluster by normals; otherwise rely on the boundary heuristic alone
    pub use_normal_based_segmentation: bool,
    pub use_boundary_edge_detection: bool,
    pub min_boundary_edges_for_fracture_face: usize,

    pub segment_refinement_enabled: bool,
    /// Initial clusters larger than this are refined
    pub refinement_min_face_count_absolute: usize,
    /// Initial clusters holding more than this share of all faces are refined
    pub refinement_min_face_percentage: f64,
    pub refinement_max_recursion_depth: usize,
    /// Segments below this size always score as coherent
    pub refinement_min_faces_for_coherency_check: usize,
    /// Segments below this size always count as homogeneous
    pub refinement_min_faces_for_roughness_check: usize,
    /// First-axis share required by the boolean orientation check
    pub refinement_coherency_normal_pca_ratio_threshold: f64,
    /// Plane distance normalizer, as a fraction of the segment extent
    pub refinement_coherency_plane_fit_dist_dev_factor: f64,
    /// Plane angle normalizer in degrees
    pub refinement_coherency_plane_fit_normal_angle_dev_deg: f64,

    pub refinement_dominant_keep_min_faces: usize,
    pub refinement_dominant_keep_pca_badness_thresh: f64,
    pub refinement_dominant_keep_planar_badness_thresh: f64,
    pub refinement_pca_split_badness_thresh: f64,
    pub refinement_planar_split_badness_thresh: f64,

    pub refinement_check_roughness_homogeneity: bool,
    pub roughness_neighbor_k: usize,
    pub refinement_roughness_std_dev_threshold: f64,

    /// Re-clustering radius as a fraction of `normal_cluster_eps`
    pub refinement_split_strict_eps_factor: f64,
    /// Re-clustering core threshold as a fraction of `normal_cluster_min_samples`
    pub refinement_split_min_samples_factor: f64,
    /// Refined segments smaller than this are not offered for selection
    pub refinement_min_final_segment_size: usize,
}

impl Default for ClusteringParameters {
    fn default() -> Self {
        Self {
            normal_cluster_eps: 0.1,
            normal_cluster_min_samples: 10,
            roughness_threshold: 0.2,
            use_normal_based_segmentation: true,
            use_boundary_edge_detection: true,
            min_boundary_edges_for_fracture_face: 1,
            segment_refinement_enabled: true,
            refinement_min_face_count_absolute: 200,
            refinement_min_face_percentage: 0.10,
            refinement_max_recursion_depth: 3,
            refinement_min_faces_for_coherency_check: 10,
            refinement_min_faces_for_roughness_check: 20,
            refinement_coherency_normal_pca_ratio_threshold: 0.9,
            refinement_coherency_plane_fit_dist_dev_factor: 0.1,
            refinement_coherency_plane_fit_normal_angle_dev_deg: 25.0,
            refinement_dominant_keep_min_faces: 500,
            refinement_dominant_keep_pca_badness_thresh: 0.35,
            refinement_dominant_keep_planar_badness_thresh: 2.5,
            refinement_pca_split_badness_thresh: 0.30,
            refinement_planar_split_badness_thresh: 2.0,
            refinement_check_roughness_homogeneity: false,
            roughness_neighbor_k: 5,
            refinement_roughness_std_dev_threshold: 0.2,
            refinement_split_strict_eps_factor: 0.7,
            refinement_split_min_samples_factor: 0.75,
            refinement_min_final_segment_size: 10,
        }
    }
}

/// Serialized form picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamsFormat {
    Json,
    Toml,
}

impl ParamsFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

impl ClusteringParameters {
    /// Load and validate parameters from a `.json` or `.toml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let parse_error = |message: String| SegmentationError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let params: ClusteringParameters = match ParamsFormat::from_path(path) {
            ParamsFormat::Json => {
                serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            ParamsFormat::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        };

        params.validate()?;
        Ok(params)
    }

    /// Save parameters to file, JSON or TOML by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = match ParamsFormat::from_path(path) {
            ParamsFormat::Json => serde_json::to_string_pretty(self).map_err(|e| e.to_string()),
            ParamsFormat::Toml => toml::to_string_pretty(self).map_err(|e| e.to_string()),
        }
        .map_err(|message| SegmentationError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every value against its domain
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &'static str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SegmentationError::invalid_param(name, value, "must be positive and finite"))
            }
        }
        fn non_negative(name: &'static str, value: f64) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                let reason = "must be non-negative and finite";
                Err(SegmentationError::invalid_param(name, value, reason))
            }
        }
        fn fraction(name: &'static str, value: f64) -> Result<()> {
            if value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(SegmentationError::invalid_param(name, value, "must be in (0, 1]"))
            }
        }

        positive("normal_cluster_eps", self.normal_cluster_eps)?;
        if self.normal_cluster_min_samples == 0 {
            return Err(SegmentationError::invalid_param(
                "normal_cluster_min_samples",
                0,
                "must be at least 1",
            ));
        }
        non_negative("roughness_threshold", self.roughness_threshold)?;
        if !(1..=3).contains(&self.min_boundary_edges_for_fracture_face) {
            return Err(SegmentationError::invalid_param(
                "min_boundary_edges_for_fracture_face",
                self.min_boundary_edges_for_fracture_face,
                "a triangle has between 1 and 3 edges",
            ));
        }
        if !(0.0..=1.0).contains(&self.refinement_min_face_percentage) {
            return Err(SegmentationError::invalid_param(
                "refinement_min_face_percentage",
                self.refinement_min_face_percentage,
                "must be in [0, 1]",
            ));
        }
        fraction(
            "refinement_coherency_normal_pca_ratio_threshold",
            self.refinement_coherency_normal_pca_ratio_threshold,
        )?;
        positive(
            "refinement_coherency_plane_fit_dist_dev_factor",
            self.refinement_coherency_plane_fit_dist_dev_factor,
        )?;
        positive(
            "refinement_coherency_plane_fit_normal_angle_dev_deg",
            self.refinement_coherency_plane_fit_normal_angle_dev_deg,
        )?;
        non_negative(
            "refinement_dominant_keep_pca_badness_thresh",
            self.refinement_dominant_keep_pca_badness_thresh,
        )?;
        non_negative(
            "refinement_dominant_keep_planar_badness_thresh",
            self.refinement_dominant_keep_planar_badness_thresh,
        )?;
        non_negative(
            "refinement_pca_split_badness_thresh",
            self.refinement_pca_split_badness_thresh,
        )?;
        non_negative(
            "refinement_planar_split_badness_thresh",
            self.refinement_planar_split_badness_thresh,
        )?;
        if self.roughness_neighbor_k == 0 {
            return Err(SegmentationError::invalid_param(
                "roughness_neighbor_k",
                0,
                "must be at least 1",
            ));
        }
        non_negative(
            "refinement_roughness_std_dev_threshold",
            self.refinement_roughness_std_dev_threshold,
        )?;
        fraction("refinement_split_strict_eps_factor", self.refinement_split_strict_eps_factor)?;
        fraction("refinement_split_min_samples_factor", self.refinement_split_min_samples_factor)?;

        Ok(())
    }

    /// Radius used when re-clustering a segment that failed its checks
    pub fn strict_eps(&self, base_eps: f64) -> f64 {
        base_eps * self.refinement_split_strict_eps_factor
    }

    /// Core threshold used when re-clustering, never below 3
    pub fn strict_min_samples(&self, base_min_samples: usize) -> usize {
        let scaled = (base_min_samples as f64 * self.refinement_split_min_samples_factor).floor();
        (scaled as usize).max(3)
    }

    /// Whether an initial cluster of `size` faces out of `total` is refined
    pub fn should_refine(&self, size: usize, total: usize) -> bool {
        self.segment_refinement_enabled
            && (size > self.refinement_min_face_count_absolute
                || (total > 0 && size as f64 / total as f64 > self.refinement_min_face_percentage))
    }
}
