// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::{BoundingBox, MeshAdjacency};
use crate::error::{Result, SegmentationError};
use crate::utils::math::calculate_triangle_normal;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    /// True if two corners share a vertex index
    pub fn has_repeated_index(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || a == c
    }
}

/// Per-face quantities derived from positions
#[derive(Debug, Clone)]
struct FaceGeometry {
    normals: Vec<Vector3<f64>>,
    centroids: Vec<Point3<f64>>,
    areas: Vec<f64>,
}

/// Triangular fragment mesh.
///
/// Face normals, centroids, areas and the adjacency graph are derived on
/// first use and cached. Every mutation drops the caches, so they always
/// describe the current vertices and faces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<Triangle>,
    #[serde(skip)]
    geometry: OnceLock<FaceGeometry>,
    #[serde(skip)]
    adjacency: OnceLock<MeshAdjacency>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
            ..Self::default()
        }
    }

    /// Build a mesh from raw positions and index triples
    pub fn from_parts(vertices: Vec<Point3<f64>>, faces: &[[usize; 3]]) -> Self {
        Self {
            vertices,
            triangles: faces.iter().map(|&f| Triangle::new(f)).collect(),
            ..Self::default()
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        self.invalidate();
        let index = self.vertices.len();
        self.vertices.push(position);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.invalidate();
        self.triangles.push(triangle);
    }

    /// Merge with another mesh (vertices are not welded)
    pub fn merge(&mut self, other: &Mesh) {
        self.invalidate();
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Mutable vertex positions; derived face data is recomputed afterwards
    pub fn vertices_mut(&mut self) -> &mut [Point3<f64>] {
        self.invalidate();
        &mut self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Reject meshes the segmentation core cannot work on: no vertices, no
    /// faces, or faces pointing at vertices that do not exist.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return Err(SegmentationError::EmptyMesh {
                vertices: self.vertices.len(),
                faces: self.triangles.len(),
            });
        }

        let vertex_count = self.vertices.len();
        for (face, triangle) in self.triangles.iter().enumerate() {
            if let Some(&vertex) = triangle.indices.iter().find(|&&v| v >= vertex_count) {
                return Err(SegmentationError::InvalidVertexIndex {
                    face,
                    vertex,
                    vertex_count,
                });
            }
        }

        Ok(())
    }

    /// Unit normal per face; the zero vector marks a degenerate face
    pub fn face_normals(&self) -> &[Vector3<f64>] {
        &self.face_geometry().normals
    }

    /// Centroid per face
    pub fn face_centroids(&self) -> &[Point3<f64>] {
        &self.face_geometry().centroids
    }

    /// Area per face
    pub fn face_areas(&self) -> &[f64] {
        &self.face_geometry().areas
    }

    /// Face adjacency graph and boundary edges, built once on first use
    pub fn adjacency(&self) -> &MeshAdjacency {
        self.adjacency
            .get_or_init(|| MeshAdjacency::build(&self.triangles))
    }

    /// A mesh is watertight when no edge borders a single face
    pub fn is_watertight(&self) -> bool {
        self.adjacency().is_watertight()
    }

    fn face_geometry(&self) -> &FaceGeometry {
        self.geometry.get_or_init(|| {
            let mut normals = Vec::with_capacity(self.triangles.len());
            let mut centroids = Vec::with_capacity(self.triangles.len());
            let mut areas = Vec::with_capacity(self.triangles.len());

            for triangle in &self.triangles {
                let corners = triangle.indices.map(|i| self.vertices.get(i));
                match corners {
                    [Some(p0), Some(p1), Some(p2)] => {
                        normals.push(calculate_triangle_normal(p0, p1, p2));
                        centroids.push(Point3::from((p0.coords + p1.coords + p2.coords) / 3.0));
                        areas.push((p1 - p0).cross(&(p2 - p0)).norm() * 0.5);
                    }
                    // Out-of-range faces are rejected by validate(); keep the
                    // arrays aligned with the face list regardless.
                    _ => {
                        normals.push(Vector3::zeros());
                        centroids.push(Point3::origin());
                        areas.push(0.0);
                    }
                }
            }

            FaceGeometry {
                normals,
                centroids,
                areas,
            }
        })
    }

    fn invalidate(&mut self) {
        self.geometry.take();
        self.adjacency.take();
    }

    /// Extract the faces selected by `mask` into a standalone mesh.
    ///
    /// Degenerate triangles are dropped and unreferenced vertices removed, so
    /// the result may have fewer faces than the mask selects.
    pub fn submesh(&self, mask: &[bool]) -> Mesh {
        let mut out = Mesh {
            vertices: self.vertices.clone(),
            triangles: self
                .triangles
                .iter()
                .zip(mask)
                .filter(|(_, &selected)| selected)
                .map(|(triangle, _)| *triangle)
                .collect(),
            ..Mesh::default()
        };
        out.remove_degenerate_triangles();
        out.remove_orphaned_vertices();
        out
    }

    /// Remove triangles with repeated or out-of-range indices, or zero area.
    /// Returns the number of triangles removed
    pub fn remove_degenerate_triangles(&mut self) -> usize {
        const AREA_EPS: f64 = 1e-12;
        self.invalidate();

        let original_count = self.triangles.len();
        let vertices = &self.vertices;
        self.triangles.retain(|triangle| {
            if triangle.has_repeated_index() {
                return false;
            }
            match triangle.indices.map(|i| vertices.get(i)) {
                [Some(p0), Some(p1), Some(p2)] => {
                    (p1 - p0).cross(&(p2 - p0)).norm() * 0.5 > AREA_EPS
                }
                _ => false,
            }
        });

        original_count - self.triangles.len()
    }

    /// Remove orphaned vertices (vertices not referenced by any triangle)
    /// Returns the number of vertices removed
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        self.invalidate();

        if self.triangles.is_empty() {
            let removed = self.vertices.len();
            self.vertices.clear();
            return removed;
        }

        // Find which vertices are used
        let mut used_vertices = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &idx in &triangle.indices {
                used_vertices[idx] = true;
            }
        }

        // Build remapping: old_index -> new_index
        let mut new_indices = vec![0; self.vertices.len()];
        let mut new_vertices = Vec::new();

        for (old_idx, &used) in used_vertices.iter().enumerate() {
            if used {
                new_indices[old_idx] = new_vertices.len();
                new_vertices.push(self.vertices[old_idx]);
            }
        }

        for triangle in &mut self.triangles {
            triangle.indices = triangle.indices.map(|i| new_indices[i]);
        }

        let removed = self.vertices.len() - new_vertices.len();
        self.vertices = new_vertices;
        removed
    }
}
