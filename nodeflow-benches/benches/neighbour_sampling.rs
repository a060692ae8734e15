//! Node flow sampling benchmarks.
//!
//! Measures uniform and weighted multi-hop sampling over a hub-heavy
//! synthetic graph, plus the batched loader with several workers.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use nodeflow_benches::{
    error::BenchSetupError,
    graph::{SyntheticGraphConfig, synthetic_graph, synthetic_weights},
    params::NodeFlowBenchParams,
};
use nodeflow_core::{LoaderParams, NodeFlowLoader, NodeFlowSampler, SamplingParams};

const SEED: u64 = 42;

const NODE_COUNT: usize = 20_000;

const CASES: &[NodeFlowBenchParams] = &[
    NodeFlowBenchParams {
        seeds: 64,
        hops: 2,
        max_neighbours: 10,
    },
    NodeFlowBenchParams {
        seeds: 256,
        hops: 2,
        max_neighbours: 10,
    },
    NodeFlowBenchParams {
        seeds: 64,
        hops: 3,
        max_neighbours: 5,
    },
];

fn graph_config() -> SyntheticGraphConfig {
    SyntheticGraphConfig {
        node_count: NODE_COUNT,
        out_degree: 12,
        hub_count: 200,
        seed: SEED,
    }
}

fn seeds(count: usize) -> Vec<usize> {
    (0..count).map(|i| (i * 7_919) % NODE_COUNT).collect()
}

fn node_flow_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let graph = synthetic_graph(&graph_config())?;
    let probability = synthetic_weights(NODE_COUNT, SEED);
    let mut group = c.benchmark_group("node_flow");
    group.sample_size(30);

    for params in CASES {
        let sampler = NodeFlowSampler::new(
            SamplingParams::new(params.hops, params.max_neighbours)?.with_rng_seed(SEED),
        );
        let seeds = seeds(params.seeds);
        group.bench_with_input(
            BenchmarkId::new("uniform", params),
            &seeds,
            |b, seeds| b.iter(|| sampler.sample(&graph, seeds)),
        );
        group.bench_with_input(
            BenchmarkId::new("weighted", params),
            &seeds,
            |b, seeds| b.iter(|| sampler.sample_weighted(&graph, seeds, &probability)),
        );
    }

    group.finish();
    Ok(())
}

fn loader_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let graph = synthetic_graph(&graph_config())?;
    let all_seeds = seeds(2_048);
    let sampling = SamplingParams::new(2, 10)?.with_rng_seed(SEED);
    let mut group = c.benchmark_group("node_flow_loader");
    group.sample_size(10);

    for workers in [1, 4] {
        let loader_params = LoaderParams::new(128)?
            .with_shuffle(true)
            .with_workers(workers);
        group.bench_function(BenchmarkId::new("workers", workers), |b| {
            b.iter(|| {
                NodeFlowLoader::new(&graph, &all_seeds, sampling.clone(), loader_params)
                    .map(|loader| loader.filter(Result::is_ok).count())
            });
        });
    }

    group.finish();
    Ok(())
}

fn neighbour_sampling(c: &mut Criterion) {
    if let Err(err) = node_flow_impl(c) {
        panic!("node_flow benchmark setup failed: {err}");
    }
    if let Err(err) = loader_impl(c) {
        panic!("node_flow_loader benchmark setup failed: {err}");
    }
}

criterion_group!(benches, neighbour_sampling);
criterion_main!(benches);
