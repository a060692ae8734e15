//! Parallel random walk benchmarks.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use nodeflow_benches::{
    error::BenchSetupError,
    graph::{SyntheticGraphConfig, synthetic_graph},
    params::WalkBenchParams,
};
use nodeflow_core::{DeadEndPolicy, RandomWalker, WalkParams};

const SEED: u64 = 42;

const NODE_COUNT: usize = 50_000;

const TRACES_PER_SEED: usize = 4;

const CASES: &[WalkBenchParams] = &[
    WalkBenchParams {
        seeds: 1_000,
        hops: 8,
    },
    WalkBenchParams {
        seeds: 10_000,
        hops: 8,
    },
    WalkBenchParams {
        seeds: 1_000,
        hops: 64,
    },
];

fn random_walk_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let graph = synthetic_graph(&SyntheticGraphConfig {
        node_count: NODE_COUNT,
        out_degree: 8,
        hub_count: 500,
        seed: SEED,
    })?;
    let mut group = c.benchmark_group("random_walk");
    group.sample_size(20);

    for params in CASES {
        let walker = RandomWalker::new(
            WalkParams::new(TRACES_PER_SEED, params.hops)?
                .with_dead_end_policy(DeadEndPolicy::Stay)
                .with_rng_seed(SEED),
        );
        let seeds: Vec<usize> = (0..params.seeds).map(|i| i % NODE_COUNT).collect();
        group.bench_with_input(BenchmarkId::from_parameter(params), &seeds, |b, seeds| {
            b.iter(|| walker.walk(&graph, seeds));
        });
    }

    group.finish();
    Ok(())
}

fn random_walk(c: &mut Criterion) {
    if let Err(err) = random_walk_impl(c) {
        panic!("random_walk benchmark setup failed: {err}");
    }
}

criterion_group!(benches, random_walk);
criterion_main!(benches);
