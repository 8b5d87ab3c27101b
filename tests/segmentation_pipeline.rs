// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end segmentation and extraction tests

use anyhow::Result;
use fracsurf::geometry::{Mesh, Primitive};
use fracsurf::segmentation::components::component_count;
use fracsurf::segmentation::{
    AbortSelector, ClusteringParameters, IndexSelector, NormalClusterer, RecursiveRefiner,
    RefinementContext, Segment, NOISE_LABEL,
};
use fracsurf::{extract_fracture_surface, FractureExtractor, Segmentation};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Flat plate next to a plate with jittered heights
fn noisy_fragment(seed: u64) -> Mesh {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut fragment = Primitive::plate(1.0, 10).to_mesh();
    let mut rough = Primitive::plate(1.0, 10).to_mesh();
    for vertex in rough.vertices_mut() {
        vertex.x += 1.5;
        vertex.z += rng.gen_range(-0.04..0.04);
    }
    fragment.merge(&rough);
    fragment
}

/// Flat plate with a second plate standing up along its `x = 1` edge
fn bent_sheet(divisions: usize) -> Mesh {
    let mut sheet = Primitive::plate(1.0, divisions).to_mesh();
    let mut wall = Primitive::plate(1.0, divisions).to_mesh();
    for vertex in wall.vertices_mut() {
        vertex.z = vertex.x;
        vertex.x = 1.0;
    }
    sheet.merge(&wall);
    sheet
}

fn assert_partition(segmentation: &Segmentation, face_count: usize) {
    let mut seen: Vec<usize> = segmentation
        .segments
        .iter()
        .chain(&segmentation.dropped)
        .flat_map(|s| s.faces().iter().copied())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..face_count).collect::<Vec<_>>());
}

#[test]
fn test_cube_yields_six_clusters() -> Result<()> {
    let cube = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
    let result = NormalClusterer::new(0.2, 3).cluster(&cube, None);

    assert_eq!(result.cluster_count(), 6);
    assert!(result.clusters.iter().all(|c| c.len() == 2));
    assert!(result.labels.iter().all(|&l| l != NOISE_LABEL));
    Ok(())
}

#[test]
fn test_refinement_partitions_and_stays_connected() -> Result<()> {
    let fragment = noisy_fragment(11);
    let params = ClusteringParameters {
        normal_cluster_eps: 0.15,
        normal_cluster_min_samples: 4,
        ..Default::default()
    };

    let extractor = FractureExtractor::new(params.clone())?;
    let segmentation = extractor.segment(&fragment)?;
    println!(
        "segments: {}, dropped: {}, stats: {:?}",
        segmentation.segments.len(),
        segmentation.dropped.len(),
        segmentation.stats
    );

    assert_partition(&segmentation, fragment.triangle_count());
    assert!(segmentation.stats.max_depth <= params.refinement_max_recursion_depth + 1);
    for segment in &segmentation.segments {
        assert!(segment.len() >= params.refinement_min_final_segment_size);
    }

    // Refined clusters are always single components
    let mut refiner = RecursiveRefiner::new(&fragment, &params);
    let all = Segment::new((0..fragment.triangle_count()).collect());
    for segment in refiner.refine(all, RefinementContext::from_params(&params)) {
        assert_eq!(component_count(&fragment, segment.faces()), 1);
    }
    Ok(())
}

#[test]
fn test_flat_plate_is_one_segment() -> Result<()> {
    let plate = Primitive::plate(4.0, 16).to_mesh();
    let extractor = FractureExtractor::new(ClusteringParameters::default())?;

    let first = extractor.segment(&plate)?;
    assert_eq!(first.segments.len(), 1);
    assert_eq!(first.segments[0].len(), plate.triangle_count());

    // Refining the result again changes nothing
    let params = extractor.params();
    let mut refiner = RecursiveRefiner::new(&plate, params);
    let again = refiner.refine(first.segments[0].clone(), RefinementContext::from_params(params));
    assert_eq!(again, first.segments);
    Ok(())
}

#[test]
fn test_fine_sphere_terminates_within_depth() -> Result<()> {
    let sphere = Primitive::sphere(2.0, 48).to_mesh();
    let params = ClusteringParameters {
        refinement_max_recursion_depth: 2,
        ..Default::default()
    };

    let segmentation = FractureExtractor::new(params.clone())?.segment(&sphere)?;
    assert_partition(&segmentation, sphere.triangle_count());
    assert!(segmentation.stats.max_depth <= 3);
    Ok(())
}

#[test]
fn test_noisy_fragment_extraction() -> Result<()> {
    let fragment = noisy_fragment(42);
    let params = ClusteringParameters {
        normal_cluster_eps: 0.15,
        normal_cluster_min_samples: 4,
        refinement_min_final_segment_size: 5,
        ..Default::default()
    };

    let surface = extract_fracture_surface(&fragment, &params)?;
    if let Some(surface) = surface {
        assert_eq!(surface.mask.len(), fragment.triangle_count());
        assert_eq!(surface.mesh.triangle_count(), surface.mask.count());
        assert!(surface.mesh.vertex_count() <= fragment.vertex_count());
    }
    Ok(())
}

#[test]
fn test_automatic_extraction_returns_heuristic_candidates() -> Result<()> {
    let sheet = bent_sheet(8);
    let params = ClusteringParameters::default();
    let extractor = FractureExtractor::new(params.clone())?;

    let segmentation = extractor.segment(&sheet)?;
    let expected = extractor.candidates(&sheet, &segmentation);
    let surface = extract_fracture_surface(&sheet, &params)?.expect("candidates on both plates");

    assert_eq!(surface.mask, expected);
    assert_eq!(surface.mesh.triangle_count(), expected.count());
    // The roughest plate plus the rim faces of the other one
    assert!(surface.mask.count() > 128);
    assert!(surface.mask.count() < sheet.triangle_count());
    Ok(())
}

#[test]
fn test_manual_selection_and_abort() -> Result<()> {
    let open = Primitive::open_box(Vector3::new(2.0, 1.0, 1.0)).to_mesh();
    let params = ClusteringParameters {
        normal_cluster_eps: 0.2,
        normal_cluster_min_samples: 2,
        refinement_min_final_segment_size: 1,
        ..Default::default()
    };
    let extractor = FractureExtractor::new(params)?;

    let segmentation = extractor.segment(&open)?;
    assert_eq!(segmentation.segments.len(), 5);

    let surface = extractor
        .extract_with(&open, &IndexSelector::new(vec![1, 3]))?
        .expect("two sides selected");
    assert_eq!(surface.mask.count(), 4);
    assert_eq!(surface.mesh.triangle_count(), 4);

    assert!(extractor.extract_with(&open, &AbortSelector)?.is_none());
    Ok(())
}

#[test]
fn test_invalid_mesh_is_rejected() {
    let mesh = Mesh::from_parts(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)], &[[0, 1, 5]]);
    let err = extract_fracture_surface(&mesh, &ClusteringParameters::default()).unwrap_err();
    assert!(err.is_invalid_mesh());
}
