//! Benchmark for mesh building per LOD.
//!
//! Run with: cargo bench --package endless_procedural --bench mesh_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use endless_core::Vec2;
use endless_procedural::{MeshConfig, NoiseSettings, TerrainGenerator};

fn benchmark_build_mesh(c: &mut Criterion) {
    let generator = TerrainGenerator::new(NoiseSettings::default(), &MeshConfig::default());
    let terrain = generator.generate_chunk(Vec2::ZERO);

    let mut group = c.benchmark_group("build_mesh");
    group.sample_size(20);

    for lod in [0u32, 1, 2, 4, 6] {
        group.bench_with_input(BenchmarkId::from_parameter(lod), &lod, |b, &lod| {
            b.iter(|| black_box(generator.build_mesh(&terrain.elevation, lod)));
        });
    }

    group.finish();
}

fn benchmark_full_chunk(c: &mut Criterion) {
    let generator = TerrainGenerator::new(NoiseSettings::default(), &MeshConfig::default());

    c.bench_function("field_and_lod0_mesh", |b| {
        let mut cx = 0.0f32;
        b.iter(|| {
            cx += generator.chunk_size();
            let terrain = generator.generate_chunk(Vec2::new(cx, 0.0));
            black_box(generator.build_mesh(&terrain.elevation, 0))
        });
    });
}

criterion_group!(benches, benchmark_build_mesh, benchmark_full_chunk);
criterion_main!(benches);
