// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! All primitives share vertices between neighboring faces so the adjacency
//! graph sees them as connected surfaces. Closed primitives are watertight and
//! wound with outward normals.

use super::{Mesh, Triangle};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, Copy)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    /// Cube with the top (+Y) face removed
    OpenBox { size: Vector3<f64> },
    /// Flat square plate in the XY plane, normal +Z
    Plate { size: f64, divisions: usize },
    /// Two coplanar plates separated along X by `gap`
    TwoPlates { size: f64, gap: f64, divisions: usize },
    Sphere { r: f64, fn_: u32 },
    Cylinder { h: f64, r: f64, fn_: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn open_box(size: Vector3<f64>) -> Self {
        Self::OpenBox { size }
    }

    pub fn plate(size: f64, divisions: usize) -> Self {
        Self::Plate {
            size,
            divisions: divisions.max(1),
        }
    }

    pub fn two_plates(size: f64, gap: f64, divisions: usize) -> Self {
        Self::TwoPlates {
            size,
            gap,
            divisions: divisions.max(1),
        }
    }

    pub fn sphere(r: f64, fn_: u32) -> Self {
        let segments = if fn_ > 0 { fn_.max(3) } else { 32 };
        Self::Sphere { r, fn_: segments }
    }

    pub fn cylinder(h: f64, r: f64, fn_: u32) -> Self {
        let segments = if fn_ > 0 { fn_.max(3) } else { 32 };
        Self::Cylinder {
            h,
            r,
            fn_: segments,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        match *self {
            Self::Cube { size, center } => generate_cube_mesh(size, center, true),
            Self::OpenBox { size } => generate_cube_mesh(size, false, false),
            Self::Plate { size, divisions } => generate_plate_mesh(size, divisions, 0.0),
            Self::TwoPlates {
                size,
                gap,
                divisions,
            } => {
                let mut mesh = generate_plate_mesh(size, divisions, 0.0);
                mesh.merge(&generate_plate_mesh(size, divisions, size + gap));
                mesh
            }
            Self::Sphere { r, fn_ } => generate_sphere_mesh(r, fn_ as usize),
            Self::Cylinder { h, r, fn_ } => generate_cylinder_mesh(h, r, fn_ as usize),
        }
    }
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool, with_top: bool) -> Mesh {
    let (min, max) = if center {
        (-size / 2.0, size / 2.0)
    } else {
        (Vector3::zeros(), size)
    };

    // 8 vertices of the cube
    let positions = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let mut faces = vec![
        // Front (z+)
        [4, 5, 6],
        [4, 6, 7],
        // Back (z-)
        [1, 0, 3],
        [1, 3, 2],
        // Right (x+)
        [5, 1, 2],
        [5, 2, 6],
        // Left (x-)
        [0, 4, 7],
        [0, 7, 3],
        // Bottom (y-)
        [0, 1, 5],
        [0, 5, 4],
    ];
    if with_top {
        // Top (y+)
        faces.extend([[7, 6, 2], [7, 2, 3]]);
    }

    Mesh::from_parts(positions, &faces)
}

fn generate_plate_mesh(size: f64, divisions: usize, x_offset: f64) -> Mesh {
    let n = divisions;
    let step = size / n as f64;
    let mut mesh = Mesh::with_capacity((n + 1) * (n + 1), 2 * n * n);

    for j in 0..=n {
        for i in 0..=n {
            mesh.add_vertex(Point3::new(x_offset + i as f64 * step, j as f64 * step, 0.0));
        }
    }

    let index = |i: usize, j: usize| j * (n + 1) + i;
    for j in 0..n {
        for i in 0..n {
            mesh.add_triangle(Triangle::new([index(i, j), index(i + 1, j), index(i + 1, j + 1)]));
            mesh.add_triangle(Triangle::new([index(i, j), index(i + 1, j + 1), index(i, j + 1)]));
        }
    }

    mesh
}

/// UV sphere around the Y axis with a single vertex at each pole
fn generate_sphere_mesh(radius: f64, segments: usize) -> Mesh {
    let stacks = segments;
    let slices = segments;
    let mut mesh = Mesh::new();

    let north = mesh.add_vertex(Point3::new(0.0, radius, 0.0));
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            mesh.add_vertex(Point3::new(r * theta.cos(), y, r * theta.sin()));
        }
    }
    let south = mesh.add_vertex(Point3::new(0.0, -radius, 0.0));

    // Vertex at ring `i` (0 = north pole, stacks = south pole), slice `j`
    let at = |i: usize, j: usize| match i {
        0 => north,
        i if i == stacks => south,
        i => 1 + (i - 1) * slices + j % slices,
    };

    for i in 1..stacks - 1 {
        for j in 0..slices {
            mesh.add_triangle(Triangle::new([at(i, j), at(i, j + 1), at(i + 1, j)]));
            mesh.add_triangle(Triangle::new([at(i + 1, j), at(i, j + 1), at(i + 1, j + 1)]));
        }
    }

    // Pole fans
    for j in 0..slices {
        mesh.add_triangle(Triangle::new([at(1, j), north, at(1, j + 1)]));
        mesh.add_triangle(Triangle::new([at(stacks - 1, j), at(stacks - 1, j + 1), south]));
    }

    mesh
}

fn generate_cylinder_mesh(height: f64, radius: f64, segments: usize) -> Mesh {
    let mut mesh = Mesh::new();

    // Cylinders go from z=0 to z=height
    let bottom_center_idx = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
    let top_center_idx = mesh.add_vertex(Point3::new(0.0, 0.0, height));

    let mut bottom_indices = Vec::with_capacity(segments);
    let mut top_indices = Vec::with_capacity(segments);

    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        bottom_indices.push(mesh.add_vertex(Point3::new(radius * cos, radius * sin, 0.0)));
        top_indices.push(mesh.add_vertex(Point3::new(radius * cos, radius * sin, height)));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        let (bi, ti) = (bottom_indices[i], top_indices[i]);
        let (bn, tn) = (bottom_indices[next], top_indices[next]);

        // Caps
        mesh.add_triangle(Triangle::new([bottom_center_idx, bn, bi]));
        mesh.add_triangle(Triangle::new([top_center_idx, ti, tn]));

        // Side quad, reusing rim vertices to keep the surface closed
        mesh.add_triangle(Triangle::new([bi, bn, ti]));
        mesh.add_triangle(Triangle::new([ti, bn, tn]));
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward(mesh: &Mesh, center: Point3<f64>) {
        for (normal, centroid) in mesh.face_normals().iter().zip(mesh.face_centroids()) {
            assert!(normal.dot(&(centroid - center)) > 0.0);
        }
    }

    #[test]
    fn test_cube_generation() {
        let mesh = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), false).to_mesh();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_watertight());
        assert_eq!(mesh.adjacency().non_manifold_edge_count(), 0);
        assert_outward(&mesh, Point3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_open_box_has_rim() {
        let mesh = Primitive::open_box(Vector3::new(1.0, 1.0, 1.0)).to_mesh();
        assert_eq!(mesh.triangle_count(), 10);
        assert!(!mesh.is_watertight());
        assert_eq!(mesh.adjacency().boundary_edge_count(), 4);
    }

    #[test]
    fn test_plate_generation() {
        let mesh = Primitive::plate(4.0, 4).to_mesh();
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        assert_eq!(mesh.adjacency().boundary_edge_count(), 16);
        for normal in mesh.face_normals() {
            assert_eq!(*normal, Vector3::z());
        }
    }

    #[test]
    fn test_two_plates_do_not_touch() {
        let mesh = Primitive::two_plates(1.0, 0.5, 2).to_mesh();
        assert_eq!(mesh.triangle_count(), 16);
        let adjacency = mesh.adjacency();
        for face in 0..8 {
            assert!(adjacency.face_neighbors(face).iter().all(|&n| n < 8));
        }
    }

    #[test]
    fn test_sphere_is_closed() {
        let mesh = Primitive::sphere(2.0, 12).to_mesh();
        assert_eq!(mesh.vertex_count(), 2 + 11 * 12);
        assert!(mesh.is_watertight());
        assert_eq!(mesh.adjacency().non_manifold_edge_count(), 0);
        assert_outward(&mesh, Point3::origin());
    }

    #[test]
    fn test_cylinder_is_closed() {
        let mesh = Primitive::cylinder(10.0, 5.0, 16).to_mesh();
        // 2 cap centers plus top and bottom rims
        assert_eq!(mesh.vertex_count(), 2 + 16 * 2);
        assert_eq!(mesh.triangle_count(), 16 * 4);
        assert!(mesh.is_watertight());
        assert_outward(&mesh, Point3::new(0.0, 0.0, 5.0));
    }
}
