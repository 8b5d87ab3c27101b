// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face adjacency and boundary-edge detection
//!
//! Two faces are adjacent when they share an edge (both endpoints). Faces that
//! only touch at a vertex are not adjacent. An edge used by exactly one face is
//! a boundary edge; on a fragment scan these usually outline the break.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use super::Triangle;

/// Undirected edge stored with the smaller vertex index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub v0: usize,
    pub v1: usize,
}

impl Edge {
    pub fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }

    /// The three edges of a triangle, skipping collapsed ones
    fn of_triangle(triangle: &Triangle) -> impl Iterator<Item = Edge> + '_ {
        (0..3).filter_map(move |i| {
            let a = triangle.indices[i];
            let b = triangle.indices[(i + 1) % 3];
            (a != b).then(|| Edge::new(a, b))
        })
    }
}

/// Face adjacency graph and boundary-edge set of a triangle mesh
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    /// Sorted neighbor list per face
    neighbors: Vec<Vec<usize>>,
    /// Sorted boundary edges
    boundary_edges: Vec<Edge>,
    boundary_lookup: AHashSet<Edge>,
    /// Number of boundary edges owned by each face
    face_boundary_counts: Vec<u8>,
    edge_count: usize,
    non_manifold_edge_count: usize,
}

impl MeshAdjacency {
    /// Build adjacency from triangle indices.
    ///
    /// Indices are trusted here; [`Mesh::validate`](super::Mesh::validate) is
    /// responsible for rejecting out-of-range vertices.
    pub fn build(triangles: &[Triangle]) -> Self {
        let mut edge_to_faces: AHashMap<Edge, Vec<usize>> = AHashMap::new();

        for (face_idx, triangle) in triangles.iter().enumerate() {
            for edge in Edge::of_triangle(triangle) {
                let faces = edge_to_faces.entry(edge).or_default();
                // A face listing the same edge twice only counts once
                if faces.last() != Some(&face_idx) {
                    faces.push(face_idx);
                }
            }
        }

        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); triangles.len()];
        let mut boundary_edges = Vec::new();
        let mut non_manifold_edge_count = 0;

        for (edge, faces) in &edge_to_faces {
            match faces.len() {
                1 => boundary_edges.push(*edge),
                n => {
                    if n > 2 {
                        non_manifold_edge_count += 1;
                    }
                    for (i, &a) in faces.iter().enumerate() {
                        for &b in &faces[i + 1..] {
                            neighbors[a].push(b);
                            neighbors[b].push(a);
                        }
                    }
                }
            }
        }

        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        boundary_edges.sort_unstable();

        let boundary_lookup: AHashSet<Edge> = boundary_edges.iter().copied().collect();
        let face_boundary_counts = triangles
            .iter()
            .map(|triangle| {
                Edge::of_triangle(triangle)
                    .filter(|edge| boundary_lookup.contains(edge))
                    .count() as u8
            })
            .collect();

        Self {
            neighbors,
            boundary_edges,
            boundary_lookup,
            face_boundary_counts,
            edge_count: edge_to_faces.len(),
            non_manifold_edge_count,
        }
    }

    /// Faces sharing an edge with `face`, ascending
    pub fn face_neighbors(&self, face: usize) -> &[usize] {
        self.neighbors.get(face).map_or(&[], Vec::as_slice)
    }

    pub fn face_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Edges used by exactly one face, ascending
    pub fn boundary_edges(&self) -> &[Edge] {
        &self.boundary_edges
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.boundary_edges.len()
    }

    pub fn is_boundary_edge(&self, v0: usize, v1: usize) -> bool {
        self.boundary_lookup.contains(&Edge::new(v0, v1))
    }

    /// How many of the face's edges lie on the mesh boundary (0..=3)
    pub fn face_boundary_edge_count(&self, face: usize) -> usize {
        self.face_boundary_counts.get(face).map_or(0, |&c| c as usize)
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Edges shared by more than two faces
    pub fn non_manifold_edge_count(&self) -> usize {
        self.non_manifold_edge_count
    }

    /// A closed surface has no boundary edges
    pub fn is_watertight(&self) -> bool {
        self.boundary_edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tris(faces: &[[usize; 3]]) -> Vec<Triangle> {
        faces.iter().map(|&f| Triangle::new(f)).collect()
    }

    #[test]
    fn test_two_triangle_strip() {
        let adj = MeshAdjacency::build(&tris(&[[0, 1, 2], [1, 3, 2]]));

        assert_eq!(adj.face_neighbors(0), &[1]);
        assert_eq!(adj.face_neighbors(1), &[0]);
        assert_eq!(adj.edge_count(), 5);
        assert_eq!(adj.boundary_edge_count(), 4);
        assert!(!adj.is_boundary_edge(1, 2));
        assert!(adj.is_boundary_edge(1, 0));
        assert_eq!(adj.face_boundary_edge_count(0), 2);
        assert!(!adj.is_watertight());
    }

    #[test]
    fn test_tetrahedron_is_watertight() {
        let adj = MeshAdjacency::build(&tris(&[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]]));

        assert!(adj.is_watertight());
        for face in 0..4 {
            assert_eq!(adj.face_neighbors(face).len(), 3);
            assert_eq!(adj.face_boundary_edge_count(face), 0);
        }
    }

    #[test]
    fn test_vertex_contact_is_not_adjacency() {
        // Two triangles touching only at vertex 2
        let adj = MeshAdjacency::build(&tris(&[[0, 1, 2], [2, 3, 4]]));
        assert!(adj.face_neighbors(0).is_empty());
        assert!(adj.face_neighbors(1).is_empty());
        assert_eq!(adj.boundary_edge_count(), 6);
    }

    #[test]
    fn test_non_manifold_edge() {
        // Three faces around edge (0, 1)
        let adj = MeshAdjacency::build(&tris(&[[0, 1, 2], [1, 0, 3], [0, 1, 4]]));
        assert_eq!(adj.non_manifold_edge_count(), 1);
        assert_eq!(adj.face_neighbors(0), &[1, 2]);
        assert_eq!(adj.face_neighbors(2), &[0, 1]);
    }

    #[test]
    fn test_out_of_range_face_lookup() {
        let adj = MeshAdjacency::build(&tris(&[[0, 1, 2]]));
        assert!(adj.face_neighbors(10).is_empty());
        assert_eq!(adj.face_boundary_edge_count(10), 0);
    }
}
