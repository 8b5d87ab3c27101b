// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Connected components of face subsets

use std::collections::VecDeque;

use ahash::AHashSet;

use crate::geometry::Mesh;

/// Split `faces` into maximal edge-connected components.
///
/// Only adjacency between two faces of the subset counts. Components are
/// returned in order of their smallest face, each sorted ascending.
pub fn connected_components(mesh: &Mesh, faces: &[usize]) -> Vec<Vec<usize>> {
    match faces.len() {
        0 => return Vec::new(),
        1 => return vec![faces.to_vec()],
        _ => {}
    }

    let adjacency = mesh.adjacency();
    let members: AHashSet<usize> = faces.iter().copied().collect();
    let mut visited: AHashSet<usize> = AHashSet::with_capacity(members.len());

    let mut seeds = faces.to_vec();
    seeds.sort_unstable();
    seeds.dedup();

    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for seed in seeds {
        if !visited.insert(seed) {
            continue;
        }

        let mut component = vec![seed];
        queue.push_back(seed);

        while let Some(face) = queue.pop_front() {
            for &neighbor in adjacency.face_neighbors(face) {
                if members.contains(&neighbor) && visited.insert(neighbor) {
                    component.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }

    components
}

/// Number of connected components of `faces`
pub fn component_count(mesh: &Mesh, faces: &[usize]) -> usize {
    connected_components(mesh, faces).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;

    #[test]
    fn test_trivial_subsets() {
        let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        assert!(connected_components(&cube, &[]).is_empty());
        assert_eq!(connected_components(&cube, &[4]), vec![vec![4]]);
    }

    #[test]
    fn test_disjoint_plates() {
        let mesh = Primitive::two_plates(1.0, 0.5, 2).to_mesh();
        let faces: Vec<usize> = (0..16).rev().collect();
        let components = connected_components(&mesh, &faces);

        assert_eq!(components.len(), 2);
        assert_eq!(components[0], (0..8).collect::<Vec<_>>());
        assert_eq!(components[1], (8..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_adjacency_outside_subset_is_ignored() {
        // Opposite cube sides only connect through the sides in between
        let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        let front_and_back = [0, 1, 2, 3];
        assert_eq!(component_count(&cube, &front_and_back), 2);

        let with_right_side = [0, 1, 2, 3, 4, 5];
        assert_eq!(component_count(&cube, &with_right_side), 1);
    }
}
