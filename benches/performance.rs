// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fracsurf::geometry::{MeshAdjacency, Primitive};
use fracsurf::segmentation::{
    ClusteringParameters, NormalClusterer, RecursiveRefiner, RefinementContext, Segment,
};
use fracsurf::FractureExtractor;
use nalgebra::Vector3;

fn bench_adjacency(c: &mut Criterion) {
    let mut group = c.benchmark_group("adjacency");

    for segments in [32u32, 64, 128] {
        let sphere = Primitive::sphere(10.0, segments).to_mesh();
        group.bench_with_input(
            BenchmarkId::new("sphere", sphere.triangle_count()),
            &sphere,
            |b, mesh| b.iter(|| MeshAdjacency::build(black_box(mesh.triangles()))),
        );
    }

    group.finish();
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("normal_clustering");
    let params = ClusteringParameters::default();

    for segments in [32u32, 64, 128] {
        let sphere = Primitive::sphere(10.0, segments).to_mesh();
        // warm the face geometry cache
        let _ = sphere.face_normals();
        let clusterer = NormalClusterer::from_params(&params);
        group.bench_with_input(
            BenchmarkId::new("sphere", sphere.triangle_count()),
            &sphere,
            |b, mesh| b.iter(|| clusterer.cluster(black_box(mesh), None)),
        );
    }

    group.finish();
}

fn bench_refinement(c: &mut Criterion) {
    let mut group = c.benchmark_group("refinement");
    let params = ClusteringParameters::default();

    let sphere = Primitive::sphere(10.0, 64).to_mesh();
    let _ = sphere.adjacency();
    let all = Segment::new((0..sphere.triangle_count()).collect());

    group.bench_function("sphere_64", |b| {
        b.iter(|| {
            let mut refiner = RecursiveRefiner::new(&sphere, &params);
            refiner.refine(black_box(all.clone()), RefinementContext::from_params(&params))
        });
    });

    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let extractor = FractureExtractor::new(ClusteringParameters::default()).unwrap();

    let open = Primitive::open_box(Vector3::new(10.0, 10.0, 10.0)).to_mesh();
    group.bench_function("open_box", |b| {
        b.iter(|| extractor.extract(black_box(&open)))
    });

    let cylinder = Primitive::cylinder(20.0, 5.0, 64).to_mesh();
    group.bench_function("cylinder_64", |b| {
        b.iter(|| extractor.segment(black_box(&cylinder)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_adjacency,
    bench_clustering,
    bench_refinement,
    bench_extraction
);
criterion_main!(benches);
