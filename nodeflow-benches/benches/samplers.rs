//! Categorical sampler benchmarks.
//!
//! Compares the alias, CDF, and sum-tree samplers on repeated draws with
//! replacement and on drawing a bounded subset without replacement, which is
//! the pattern weighted neighbour picking uses.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::SmallRng};

use nodeflow_benches::{
    error::BenchSetupError, graph::synthetic_weights, params::SamplerBenchParams,
};
use nodeflow_core::{CategoricalSampler, Replacement, SamplerKind, WeightedSampler};

const SEED: u64 = 42;

const POPULATIONS: &[usize] = &[16, 1_024, 65_536];

/// Items drawn per iteration in the without-replacement group.
const SUBSET: usize = 10;

fn draw_with_replacement_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("sampler_draw_with_replacement");
    for &population in POPULATIONS {
        let weights = synthetic_weights(population, SEED);
        for kind in SamplerKind::ALL {
            let mut sampler = WeightedSampler::new(kind, &weights, Replacement::With)?;
            let mut rng = SmallRng::seed_from_u64(SEED);
            group.bench_function(
                BenchmarkId::from_parameter(SamplerBenchParams { kind, population }),
                |b| b.iter(|| sampler.draw(&mut rng)),
            );
        }
    }
    group.finish();
    Ok(())
}

fn draw_subset_without_replacement_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("sampler_subset_without_replacement");
    for &population in POPULATIONS {
        let weights = synthetic_weights(population, SEED);
        for kind in SamplerKind::ALL {
            let mut sampler = WeightedSampler::new(kind, &weights, Replacement::Without)?;
            let mut rng = SmallRng::seed_from_u64(SEED);
            group.bench_function(
                BenchmarkId::from_parameter(SamplerBenchParams { kind, population }),
                |b| {
                    b.iter(|| {
                        if sampler.reset(&weights).is_err() {
                            return 0;
                        }
                        (0..SUBSET)
                            .map_while(|_| sampler.draw(&mut rng).ok())
                            .count()
                    });
                },
            );
        }
    }
    group.finish();
    Ok(())
}

fn samplers(c: &mut Criterion) {
    if let Err(err) = draw_with_replacement_impl(c) {
        panic!("sampler_draw_with_replacement setup failed: {err}");
    }
    if let Err(err) = draw_subset_without_replacement_impl(c) {
        panic!("sampler_subset_without_replacement setup failed: {err}");
    }
}

criterion_group!(benches, samplers);
criterion_main!(benches);
