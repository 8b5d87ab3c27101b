// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face-set segments

use crate::geometry::Mesh;
use crate::utils::math::try_unit;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A set of face indices into one mesh, kept sorted and free of duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    faces: Vec<usize>,
}

impl Segment {
    pub fn new(mut faces: Vec<usize>) -> Self {
        faces.sort_unstable();
        faces.dedup();
        Self { faces }
    }

    pub fn faces(&self) -> &[usize] {
        &self.faces
    }

    pub fn into_faces(self) -> Vec<usize> {
        self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn contains(&self, face: usize) -> bool {
        self.faces.binary_search(&face).is_ok()
    }

    /// Mean of the face centroids
    pub fn centroid(&self, mesh: &Mesh) -> Option<Point3<f64>> {
        if self.faces.is_empty() {
            return None;
        }
        let centroids = mesh.face_centroids();
        let sum = self
            .faces
            .iter()
            .fold(Vector3::zeros(), |acc, &f| acc + centroids[f].coords);
        Some(Point3::from(sum / self.faces.len() as f64))
    }

    /// Area-weighted mean normal, `None` when the normals cancel out
    pub fn mean_normal(&self, mesh: &Mesh) -> Option<Vector3<f64>> {
        let normals = mesh.face_normals();
        let areas = mesh.face_areas();
        let sum = self
            .faces
            .iter()
            .fold(Vector3::zeros(), |acc, &f| acc + normals[f] * areas[f]);
        try_unit(&sum)
    }

    /// Total surface area
    pub fn area(&self, mesh: &Mesh) -> f64 {
        let areas = mesh.face_areas();
        self.faces.iter().map(|&f| areas[f]).sum()
    }
}

impl From<Vec<usize>> for Segment {
    fn from(faces: Vec<usize>) -> Self {
        Self::new(faces)
    }
}
