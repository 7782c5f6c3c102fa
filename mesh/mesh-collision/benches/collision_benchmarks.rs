//! Benchmarks for mesh-collision queries.
//!
//! Run with: cargo bench -p mesh-collision
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-collision -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-collision -- --baseline main

#![allow(
    missing_docs,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::unwrap_used
)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_collision::{
    CollisionConfig, CollisionDetector, IndexedMesh, Isometry3, TranslationDetector, Translation3,
    Vector3, Vertex,
};
use std::f64::consts::PI;

// =============================================================================
// Test Mesh Generation
// =============================================================================

/// Closed latitude/longitude sphere centred at the origin.
fn create_sphere(radius: f64, stacks: u32, slices: u32) -> IndexedMesh {
    let mut mesh = IndexedMesh::new();

    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, radius));
    for i in 1..stacks {
        let theta = PI * f64::from(i) / f64::from(stacks);
        for j in 0..slices {
            let phi = 2.0 * PI * f64::from(j) / f64::from(slices);
            mesh.vertices.push(Vertex::from_coords(
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                radius * theta.cos(),
            ));
        }
    }
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, -radius));

    let ring = |i: u32, j: u32| 1 + (i - 1) * slices + (j % slices);
    let south = mesh.vertices.len() as u32 - 1;

    for j in 0..slices {
        mesh.faces.push([0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let (u0, u1) = (ring(i, j), ring(i, j + 1));
            let (l0, l1) = (ring(i + 1, j), ring(i + 1, j + 1));
            mesh.faces.push([u0, l0, l1]);
            mesh.faces.push([u0, l1, u1]);
        }
    }
    for j in 0..slices {
        mesh.faces.push([south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }

    mesh
}

/// Grid position of body `i` in a `side × side` layer, spaced so that
/// neighbours with radius 1 just overlap.
fn grid_offset(i: usize, side: usize) -> Vector3<f64> {
    let spacing = 1.9;
    Vector3::new((i % side) as f64 * spacing, (i / side) as f64 * spacing, 0.0)
}

// =============================================================================
// Registration Benchmarks
// =============================================================================

fn bench_register(c: &mut Criterion) {
    let mut group = c.benchmark_group("Register");

    for (stacks, slices) in [(8, 16), (32, 64), (96, 192)] {
        let sphere = create_sphere(1.0, stacks, slices);
        group.throughput(Throughput::Elements(sphere.faces.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("sphere", sphere.faces.len()),
            &sphere,
            |b, sphere| {
                b.iter(|| {
                    let mut detector = CollisionDetector::new();
                    detector.register(black_box(sphere), true).unwrap();
                    detector
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// Move-and-Query Benchmarks
// =============================================================================

fn bench_move_and_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("MoveAndQuery");

    let sphere = create_sphere(1.0, 16, 32);
    let side = 8;
    let count = side * side;

    for (label, config) in [
        ("no_cache", CollisionConfig::default()),
        ("bbox_cache", CollisionConfig::interactive()),
    ] {
        let mut detector: TranslationDetector<'_> =
            CollisionDetector::from_meshes(std::iter::repeat_n(&sphere, count), true, config)
                .unwrap();
        for id in 0..count {
            let offset = grid_offset(id, side);
            detector.set_transform(id, Translation3::from(offset));
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(BenchmarkId::new("intersections", label), |b| {
            let mut step = 0usize;
            b.iter(|| {
                let id = step % count;
                step += 1;
                let wobble = 0.05 * (step % 7) as f64;
                let offset = grid_offset(id, side) + Vector3::new(wobble, 0.0, 0.0);
                black_box(
                    detector
                        .set_transform_and_intersections(id, Translation3::from(offset))
                        .unwrap(),
                )
            });
        });

        group.bench_function(BenchmarkId::new("intersections_and_inclusions", label), |b| {
            let mut step = 0usize;
            b.iter(|| {
                let id = step % count;
                step += 1;
                black_box(detector.intersections_and_inclusions(id).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_rotating_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("RotatingPair");

    let outer = create_sphere(3.0, 48, 96);
    let inner = create_sphere(1.0, 48, 96);

    let mut detector = CollisionDetector::new();
    let a = detector.register(&outer, true).unwrap();
    let b = detector.register(&inner, true).unwrap();

    group.bench_function("enclosed_spinning", |bench| {
        let mut angle = 0.0_f64;
        bench.iter(|| {
            angle += 0.01;
            let placement =
                Isometry3::new(Vector3::new(0.5, 0.0, 0.0), Vector3::new(0.0, angle, 0.0));
            detector.set_transform(b, placement);
            black_box(detector.intersections_and_inclusions(a).unwrap())
        });
    });

    group.bench_function("crossing_spinning", |bench| {
        let mut angle = 0.0_f64;
        bench.iter(|| {
            angle += 0.01;
            let placement =
                Isometry3::new(Vector3::new(2.5, 0.0, 0.0), Vector3::new(angle, 0.0, 0.0));
            detector.set_transform(b, placement);
            black_box(detector.intersections(a).unwrap())
        });
    });

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_register, bench_move_and_query, bench_rotating_pair);
criterion_main!(benches);
