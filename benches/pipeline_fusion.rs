//! Fused vs chained execution
//!
//! The chained baseline materialises one vector per stage, the way
//! `filter(..).map(..).reduce(..)` does over arrays. The fused procedure makes a
//! single pass with no intermediates.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loopfuse::pipeline::Source;
use loopfuse::{pipeline, Pipeline, PipelineCache};

fn generate_test_data(size: usize) -> Vec<u64> {
    (1..=size as u64).collect()
}

fn chained_filter_map(data: &[u64]) -> Vec<u64> {
    let filtered: Vec<u64> = data.iter().copied().filter(|v| v % 2 == 0).collect();
    filtered.iter().map(|v| v + 1).collect()
}

fn chained_filter_reduce(data: &[u64]) -> u64 {
    let filtered: Vec<u64> = data.iter().copied().filter(|v| v % 2 == 0).collect();
    filtered.iter().fold(0, |acc, v| acc + v)
}

fn chained_filter_join(data: &[u64]) -> String {
    let filtered: Vec<String> = data
        .iter()
        .filter(|v| *v % 2 == 0)
        .map(ToString::to_string)
        .collect();
    filtered.join(",")
}

fn bench_fusion(c: &mut Criterion) {
    let sizes = vec![30, 1_000, 100_000];

    let filter_map = pipeline::<u64>()
        .filter(|v, _| v % 2 == 0)
        .map(|v, _| v + 1)
        .build()
        .expect("filter/map pipeline compiles");
    let filter_reduce = pipeline::<u64>()
        .filter(|v, _| v % 2 == 0)
        .reduce(|acc, v, _| acc + v, 0_u64)
        .build()
        .expect("filter/reduce pipeline compiles");
    let filter_join = pipeline::<u64>()
        .filter(|v, _| v % 2 == 0)
        .join()
        .build()
        .expect("filter/join pipeline compiles");

    // Every iteration goes through the keyed lookup before executing
    let cache = PipelineCache::new();
    let declare_join = |p: Pipeline<Source<u64>>| p.filter(|v, _| v % 2 == 0).join();

    let mut group = c.benchmark_group("pipeline_fusion");

    for size in sizes {
        let data = generate_test_data(size);

        group.bench_with_input(BenchmarkId::new("chained_filter_map", size), &data, |b, data| {
            b.iter(|| black_box(chained_filter_map(data)))
        });
        group.bench_with_input(BenchmarkId::new("fused_filter_map", size), &data, |b, data| {
            b.iter(|| black_box(filter_map.execute(data)))
        });

        group.bench_with_input(BenchmarkId::new("chained_filter_reduce", size), &data, |b, data| {
            b.iter(|| black_box(chained_filter_reduce(data)))
        });
        group.bench_with_input(BenchmarkId::new("fused_filter_reduce", size), &data, |b, data| {
            b.iter(|| black_box(filter_reduce.execute(data)))
        });

        group.bench_with_input(BenchmarkId::new("chained_filter_join", size), &data, |b, data| {
            b.iter(|| black_box(chained_filter_join(data)))
        });
        group.bench_with_input(BenchmarkId::new("fused_filter_join", size), &data, |b, data| {
            b.iter(|| black_box(filter_join.execute(data)))
        });
        group.bench_with_input(BenchmarkId::new("cached_filter_join", size), &data, |b, data| {
            b.iter(|| {
                let cached = cache
                    .obtain("filter_join", declare_join)
                    .expect("cached filter/join pipeline compiles");
                black_box(cached.execute(data))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fusion);
criterion_main!(benches);
