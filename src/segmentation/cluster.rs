// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Density-based clustering of face normals
//!
//! DBSCAN over unit normals with a uniform grid of cell size `eps`, so a
//! region query only visits the 27 cells around a point. Two faces are
//! reachable when their normals are at most `eps` apart; a core face has at
//! least `min_samples` faces (itself included) within that distance.

use std::collections::VecDeque;

use ahash::AHashMap;
use log::{debug, trace};
use nalgebra::Vector3;

use super::ClusteringParameters;
use crate::geometry::Mesh;
use crate::utils::math::DEGENERATE_NORM;

/// Label of faces not density-connected to any core face
pub const NOISE_LABEL: i64 = -1;

const UNVISITED: i64 = i64::MIN;

/// Smallest grid cell; an `eps` below it still matches identical normals
const MIN_CELL_SIZE: f64 = 1e-9;

/// Clusters found over a set of faces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusteringResult {
    /// Face indices per cluster, ascending; cluster `i` has label `i`
    pub clusters: Vec<Vec<usize>>,
    /// Label of each entry of `faces`
    pub labels: Vec<i64>,
    /// The clustered faces, ascending
    pub faces: Vec<usize>,
}

impl ClusteringResult {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Faces labelled as noise, ascending
    pub fn noise(&self) -> Vec<usize> {
        self.faces
            .iter()
            .zip(&self.labels)
            .filter(|(_, &label)| label == NOISE_LABEL)
            .map(|(&face, _)| face)
            .collect()
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE_LABEL).count()
    }
}

/// Groups faces of similar orientation
#[derive(Debug, Clone, Copy)]
pub struct NormalClusterer {
    eps: f64,
    min_samples: usize,
}

impl NormalClusterer {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples: min_samples.max(1),
        }
    }

    /// Clusterer for the initial whole-mesh pass
    pub fn from_params(params: &ClusteringParameters) -> Self {
        Self::new(params.normal_cluster_eps, params.normal_cluster_min_samples)
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Cluster the normals of `subset`, or of every face when `None`.
    ///
    /// Underflow never fails:
    /// * fewer faces than `min_samples` form a single cluster,
    /// * faces with a degenerate normal are labelled noise,
    /// * if no face is a core face, faces are grouped by `eps`-linkage alone.
    pub fn cluster(&self, mesh: &Mesh, subset: Option<&[usize]>) -> ClusteringResult {
        let faces: Vec<usize> = match subset {
            Some(subset) => {
                let mut faces = subset.to_vec();
                faces.sort_unstable();
                faces.dedup();
                faces
            }
            None => (0..mesh.triangle_count()).collect(),
        };

        if faces.is_empty() {
            return ClusteringResult::default();
        }

        if faces.len() < self.min_samples {
            trace!(
                "{} faces below min_samples {}, single cluster",
                faces.len(),
                self.min_samples
            );
            return ClusteringResult {
                clusters: vec![faces.clone()],
                labels: vec![0; faces.len()],
                faces,
            };
        }

        let normals = mesh.face_normals();
        let mut labels = vec![NOISE_LABEL; faces.len()];

        // Positions in `faces` with a usable normal
        let valid: Vec<usize> = (0..faces.len())
            .filter(|&i| normals[faces[i]].norm() > DEGENERATE_NORM)
            .collect();

        if valid.is_empty() {
            debug!("none of {} faces has a usable normal", faces.len());
            return ClusteringResult {
                clusters: Vec::new(),
                labels,
                faces,
            };
        }

        let points: Vec<Vector3<f64>> = valid.iter().map(|&i| normals[faces[i]]).collect();
        let index = NormalGrid::new(&points, self.eps);

        let mut point_labels = dbscan(&index, self.min_samples);
        if point_labels.iter().all(|&l| l == NOISE_LABEL) && self.min_samples > 1 {
            debug!(
                "no core faces among {} (eps {}, min_samples {}), grouping by eps-linkage",
                points.len(),
                self.eps,
                self.min_samples
            );
            point_labels = dbscan(&index, 1);
        }

        let cluster_count =
            point_labels.iter().copied().max().map_or(0, |m| (m + 1).max(0)) as usize;
        let mut clusters = vec![Vec::new(); cluster_count];
        for (&position, &label) in valid.iter().zip(&point_labels) {
            labels[position] = label;
            if label >= 0 {
                clusters[label as usize].push(faces[position]);
            }
        }

        trace!(
            "clustered {} normals into {} clusters, {} noise",
            faces.len(),
            clusters.len(),
            labels.iter().filter(|&&l| l == NOISE_LABEL).count()
        );

        ClusteringResult {
            clusters,
            labels,
            faces,
        }
    }
}

type CellKey = (i64, i64, i64);

/// Uniform grid over normal vectors for fixed-radius neighbor queries
struct NormalGrid<'a> {
    points: &'a [Vector3<f64>],
    cells: AHashMap<CellKey, Vec<usize>>,
    cell_size: f64,
    eps_sq: f64,
}

impl<'a> NormalGrid<'a> {
    fn new(points: &'a [Vector3<f64>], eps: f64) -> Self {
        let cell_size = eps.max(MIN_CELL_SIZE);
        let mut cells: AHashMap<CellKey, Vec<usize>> = AHashMap::new();
        for (i, p) in points.iter().enumerate() {
            cells.entry(Self::key(p, cell_size)).or_default().push(i);
        }
        Self {
            points,
            cells,
            cell_size,
            eps_sq: eps * eps,
        }
    }

    fn key(p: &Vector3<f64>, cell_size: f64) -> CellKey {
        (
            (p.x / cell_size).floor() as i64,
            (p.y / cell_size).floor() as i64,
            (p.z / cell_size).floor() as i64,
        )
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    /// Points within `eps` of point `i`, including `i`
    fn neighbors(&self, i: usize, out: &mut Vec<usize>) {
        out.clear();
        let p = &self.points[i];
        let (cx, cy, cz) = Self::key(p, self.cell_size);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    let Some(members) = self.cells.get(&key) else {
                        continue;
                    };
                    out.extend(
                        members
                            .iter()
                            .copied()
                            .filter(|&j| (self.points[j] - p).norm_squared() <= self.eps_sq),
                    );
                }
            }
        }
    }
}

/// Classic DBSCAN; labels follow discovery order of the first core point
fn dbscan(grid: &NormalGrid<'_>, min_samples: usize) -> Vec<i64> {
    let n = grid.len();
    let mut labels = vec![UNVISITED; n];
    let mut neighbors = Vec::new();
    let mut queue = VecDeque::new();
    let mut next_label = 0i64;

    for start in 0..n {
        if labels[start] != UNVISITED {
            continue;
        }

        grid.neighbors(start, &mut neighbors);
        if neighbors.len() < min_samples {
            labels[start] = NOISE_LABEL;
            continue;
        }

        let label = next_label;
        next_label += 1;
        labels[start] = label;
        queue.extend(neighbors.iter().copied());

        while let Some(j) = queue.pop_front() {
            if labels[j] == NOISE_LABEL {
                // Border point: joins the cluster but does not expand it
                labels[j] = label;
                continue;
            }
            if labels[j] != UNVISITED {
                continue;
            }
            labels[j] = label;

            grid.neighbors(j, &mut neighbors);
            if neighbors.len() >= min_samples {
                queue.extend(
                    neighbors
                        .iter()
                        .copied()
                        .filter(|&k| labels[k] == UNVISITED || labels[k] == NOISE_LABEL),
                );
            }
        }
    }

    labels
}
