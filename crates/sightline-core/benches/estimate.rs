//! Criterion benchmarks for a full visibility cycle.
//!
//! Run with: `cargo bench -p sightline-core`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sightline_core::{
    estimate_visibility, Camera, EntityId, EstimatorSettings, TriangleMesh, TriangleScene,
};
use sightline_math::{Point3, Transform};

/// A sphere behind a row of pillars.
fn scene(segments: u32) -> (TriangleMesh, TriangleScene) {
    let target = TriangleMesh::uv_sphere(2.0, segments);
    let mut scene = TriangleScene::new();
    scene.add_mesh(EntityId(0), &target, &Transform::identity());
    for i in 0..6 {
        let x = -2.5 + i as f64;
        scene.add_mesh(
            EntityId(1 + i),
            &TriangleMesh::cube(0.4, 6.0, 0.4),
            &Transform::translation(x, 0.0, 4.0),
        );
    }
    (target, scene)
}

fn bench_estimate(c: &mut Criterion) {
    let viewpoint = Camera::looking_at(Point3::new(0.0, 1.0, 12.0), Point3::origin())
        .viewpoint()
        .unwrap();
    let (mesh, scene) = scene(32);

    let mut group = c.benchmark_group("estimate_visibility");
    for samples in [50usize, 500] {
        for parallel in [false, true] {
            let settings = EstimatorSettings {
                sample_count: samples,
                parallel,
                ..Default::default()
            };
            let id = if parallel { "parallel" } else { "serial" };
            group.bench_with_input(BenchmarkId::new(id, samples), &settings, |b, settings| {
                let mut rng = ChaCha8Rng::seed_from_u64(42);
                b.iter(|| {
                    estimate_visibility(
                        black_box(&mesh),
                        &Transform::identity(),
                        EntityId(0),
                        &viewpoint,
                        settings,
                        &scene,
                        &mut rng,
                    )
                    .unwrap()
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_estimate);
criterion_main!(benches);
