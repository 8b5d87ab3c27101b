// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL import and export

use crate::geometry::Mesh;
use anyhow::{Context, Result};
use log::debug;
use nalgebra::Point3;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

/// Read an ASCII or binary STL file.
///
/// Coincident corners are merged, so faces sharing an edge share its vertices.
pub fn import_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("Failed to open STL file: {}", path.display()))?;

    let stl = stl_io::read_stl(&mut file)
        .with_context(|| format!("Failed to parse STL file: {}", path.display()))?;

    let vertices = stl
        .vertices
        .iter()
        .map(|v| Point3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
        .collect();
    let faces: Vec<[usize; 3]> = stl.faces.iter().map(|face| face.vertices).collect();

    let mesh = Mesh::from_parts(vertices, &faces);
    debug!(
        "imported {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Export mesh to binary STL with per-face normals
pub fn export_stl(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let triangles = stl_triangles(mesh);

    let file = File::create(path)
        .with_context(|| format!("Failed to create STL file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter()).context("Failed to write STL file")?;
    writer.flush().context("Failed to write STL file")?;

    debug!("exported {} triangles to {}", triangles.len(), path.display());
    Ok(())
}

/// Export mesh to ASCII STL
pub fn export_stl_ascii(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create STL file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "solid fracture")?;
    for triangle in stl_triangles(mesh) {
        let n = triangle.normal;
        writeln!(writer, "  facet normal {} {} {}", n[0], n[1], n[2])?;
        writeln!(writer, "    outer loop")?;
        for v in &triangle.vertices {
            writeln!(writer, "      vertex {} {} {}", v[0], v[1], v[2])?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid fracture")?;
    writer.flush().context("Failed to write STL file")?;

    Ok(())
}

/// Triangles with in-range corners, as single precision STL facets
fn stl_triangles(mesh: &Mesh) -> Vec<StlTriangle> {
    let vertices = mesh.vertices();
    let normals = mesh.face_normals();

    mesh.triangles()
        .iter()
        .zip(normals)
        .filter_map(|(triangle, normal)| {
            let [a, b, c] = triangle.indices.map(|i| vertices.get(i));
            let corners =
                [a?, b?, c?].map(|p| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]));
            Some(StlTriangle {
                normal: Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
                vertices: corners,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use nalgebra::Vector3;
    use tempfile::Builder;

    #[test]
    fn test_binary_round_trip_keeps_topology() {
        let cube = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
        let file = Builder::new().suffix(".stl").tempfile().unwrap();

        export_stl(&cube, file.path()).unwrap();
        let loaded = import_stl(file.path()).unwrap();

        assert_eq!(loaded.triangle_count(), 12);
        assert_eq!(loaded.vertex_count(), 8);
        assert!(loaded.is_watertight());
        assert!(loaded.bounding_box().approx_eq(&cube.bounding_box(), 1e-6));
    }

    #[test]
    fn test_ascii_export_is_readable() {
        let plate = Primitive::plate(1.0, 2).to_mesh();
        let file = Builder::new().suffix(".stl").tempfile().unwrap();

        export_stl_ascii(&plate, file.path()).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.starts_with("solid fracture"));
        assert_eq!(text.matches("endfacet").count(), 8);

        let loaded = import_stl(file.path()).unwrap();
        assert_eq!(loaded.triangle_count(), 8);
        assert_eq!(loaded.vertex_count(), 9);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_stl(dir.path().join("missing.stl")).unwrap_err();
        assert!(err.to_string().contains("missing.stl"));
    }
}
