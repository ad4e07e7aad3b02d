//! Quick demonstration of a fused filter -> map -> reduce pipeline
//!
//! Run with `RUST_LOG=debug` to see compilation and cache events.

use std::time::Instant;

use loopfuse::{pipeline, Pipeline, PipelineCache};
use loopfuse::pipeline::Source;
use tracing_subscriber::EnvFilter;

fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn main() -> loopfuse::Result<()> {
    init_logging("info");

    println!("=== FUSION DEMO: loopfuse ===\n");

    let data: Vec<u64> = (1..=30).collect();

    let fused = pipeline::<u64>()
        .filter(|v, _| v % 2 == 0)
        .map(|v, _| v + 1)
        .reduce(|acc, v, _| acc + v, 0_u64)
        .build()?;

    println!("Stages: {}", fused.plan().queue);
    println!("Shape:  {:?}", fused.plan().shape);
    println!("Result: {}\n", fused.execute(&data)?);

    // Shared through a cache: the second declaration is ignored
    let cache = PipelineCache::new();
    let evens = cache.obtain("evens", |p: Pipeline<Source<u64>>| p.filter(|v, _| v % 2 == 0))?;
    let again = cache.obtain("evens", |p: Pipeline<Source<u64>>| p.filter(|v, _| v % 3 == 0))?;
    println!("Cached evens: {:?}", again.execute(&data[..10])?);
    println!("Same procedure: {}\n", std::sync::Arc::ptr_eq(&evens, &again));

    let size = 1_000_000;
    let iters = 20;
    let large: Vec<u64> = (1..=size).collect();

    println!("🔴 CHAINED (filter, map and reduce each over a materialised vector):");
    let start = Instant::now();
    let mut chained_results = Vec::with_capacity(iters as usize);
    for _ in 0..iters {
        let filtered: Vec<u64> = large.iter().copied().filter(|v| v % 2 == 0).collect();
        let mapped: Vec<u64> = filtered.iter().map(|v| v + 1).collect();
        chained_results.push(mapped.iter().sum::<u64>());
    }
    let elapsed_chained = start.elapsed();
    println!("   Time: {:?} (avg: {:?}/iter)", elapsed_chained, elapsed_chained / iters);

    println!("\n🟢 FUSED (1 pass, no intermediates):");
    let start = Instant::now();
    let mut fused_results = Vec::with_capacity(iters as usize);
    for _ in 0..iters {
        fused_results.push(fused.execute(&large)?);
    }
    let elapsed_fused = start.elapsed();
    println!("   Time: {:?} (avg: {:?}/iter)", elapsed_fused, elapsed_fused / iters);

    assert_eq!(chained_results, fused_results);
    let speedup = elapsed_chained.as_secs_f64() / elapsed_fused.as_secs_f64();
    println!("\n⚡ SPEEDUP: {:.2}× faster", speedup);

    Ok(())
}
