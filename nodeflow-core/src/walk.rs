//! Parallel uniform random walks.
//!
//! Every seed is walked `traces_per_seed` times for `hops` steps. Seeds are
//! spread over the rayon pool; each seed owns a disjoint chunk of the output
//! buffer and a private generator derived from the base seed and the seed's
//! position, so traces for a fixed base seed do not depend on scheduling.

use rand::Rng;
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::{
    error::{Result, SamplingError},
    graph::GraphView,
    sampling::validate_seeds,
    seed::{entropy_seed, task_rng},
};

/// What a walk does on reaching a vertex without successors.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum DeadEndPolicy {
    /// Hold position for the remaining steps.
    Stay,
    /// Abort with [`SamplingError::DeadEnd`].
    #[default]
    Fail,
}

/// Configuration for [`RandomWalker`].
///
/// # Examples
/// ```
/// use nodeflow_core::{DeadEndPolicy, WalkParams};
///
/// let params = WalkParams::new(4, 3)?
///     .with_dead_end_policy(DeadEndPolicy::Stay)
///     .with_rng_seed(9);
/// assert_eq!(params.traces_per_seed(), 4);
/// assert_eq!(params.steps(), 4);
/// # Ok::<(), nodeflow_core::SamplingError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkParams {
    traces_per_seed: usize,
    hops: usize,
    dead_end: DeadEndPolicy,
    rng_seed: u64,
}

impl WalkParams {
    /// Creates walk parameters with a base seed drawn from OS entropy.
    ///
    /// # Errors
    /// Returns [`SamplingError::InvalidParameters`] when `traces_per_seed`
    /// is zero or when `traces_per_seed * (hops + 1)` overflows `usize`.
    pub fn new(traces_per_seed: usize, hops: usize) -> Result<Self> {
        if traces_per_seed == 0 {
            return Err(SamplingError::InvalidParameters {
                reason: "traces_per_seed must be greater than zero".into(),
            });
        }
        if hops
            .checked_add(1)
            .and_then(|steps| steps.checked_mul(traces_per_seed))
            .is_none()
        {
            return Err(SamplingError::InvalidParameters {
                reason: "traces_per_seed * (hops + 1) overflows usize".into(),
            });
        }
        Ok(Self {
            traces_per_seed,
            hops,
            dead_end: DeadEndPolicy::default(),
            rng_seed: entropy_seed(),
        })
    }

    /// Sets how walks treat a vertex with no successors.
    #[must_use]
    pub fn with_dead_end_policy(mut self, policy: DeadEndPolicy) -> Self {
        self.dead_end = policy;
        self
    }

    /// Pins the base seed so walks are reproducible.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Walks started from each seed.
    #[rustfmt::skip]
    #[must_use]
    pub fn traces_per_seed(&self) -> usize { self.traces_per_seed }

    /// Steps taken per walk.
    #[rustfmt::skip]
    #[must_use]
    pub fn hops(&self) -> usize { self.hops }

    /// Vertices recorded per trace, the seed included.
    #[rustfmt::skip]
    #[must_use]
    pub fn steps(&self) -> usize { self.hops + 1 }

    /// Dead-end handling in use.
    #[rustfmt::skip]
    #[must_use]
    pub fn dead_end_policy(&self) -> DeadEndPolicy { self.dead_end }

    /// Base seed for per-seed generators.
    #[rustfmt::skip]
    #[must_use]
    pub fn rng_seed(&self) -> u64 { self.rng_seed }
}

/// Dense `[seeds, traces_per_seed, hops + 1]` walk output, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkTraces {
    data: Vec<usize>,
    seeds: usize,
    traces: usize,
    steps: usize,
}

impl WalkTraces {
    /// `(seeds, traces_per_seed, hops + 1)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.seeds, self.traces, self.steps)
    }

    /// Trace `trace` of the seed at position `seed`.
    #[must_use]
    pub fn trace(&self, seed: usize, trace: usize) -> Option<&[usize]> {
        if seed >= self.seeds || trace >= self.traces {
            return None;
        }
        let start = (seed * self.traces + trace) * self.steps;
        self.data.get(start..start + self.steps)
    }

    /// All traces as one flat slice.
    #[rustfmt::skip]
    #[must_use]
    pub fn as_slice(&self) -> &[usize] { &self.data }

    /// Consumes the traces, returning the flat buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<usize> {
        self.data
    }
}

/// Runs uniform random walks over a [`GraphView`].
///
/// # Examples
/// ```
/// use nodeflow_core::{CsrGraph, RandomWalker, WalkParams};
///
/// let graph = CsrGraph::from_edges(3, &[(0, 1), (1, 2), (2, 0)])?;
/// let traces = RandomWalker::new(WalkParams::new(2, 3)?).walk(&graph, &[0, 2])?;
/// assert_eq!(traces.shape(), (2, 2, 4));
/// assert_eq!(traces.trace(1, 0), Some(&[2, 0, 1, 2][..]));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct RandomWalker {
    params: WalkParams,
}

impl RandomWalker {
    /// Creates a walker with `params`.
    #[must_use]
    pub fn new(params: WalkParams) -> Self {
        Self { params }
    }

    /// Parameters in use.
    #[rustfmt::skip]
    #[must_use]
    pub fn params(&self) -> &WalkParams { &self.params }

    /// Walks from every seed, in parallel over seeds.
    ///
    /// Position `[i, j, 0]` of the output is always `seeds[i]`. Each later
    /// step moves to a successor chosen uniformly at random.
    ///
    /// # Errors
    /// Returns [`SamplingError::EmptySeeds`] for an empty seed list,
    /// [`SamplingError::UnknownSeed`] for a seed outside the graph, and
    /// [`SamplingError::DeadEnd`] when a walk reaches a vertex without
    /// successors under [`DeadEndPolicy::Fail`].
    #[instrument(
        name = "core.random_walk",
        err,
        skip(self, graph, seeds),
        fields(
            seeds = seeds.len(),
            traces = self.params.traces_per_seed,
            hops = self.params.hops,
            rng_seed = self.params.rng_seed,
        ),
    )]
    pub fn walk<G>(&self, graph: &G, seeds: &[usize]) -> Result<WalkTraces>
    where
        G: GraphView + Sync + ?Sized,
    {
        validate_seeds(graph, seeds)?;

        let traces = self.params.traces_per_seed;
        let steps = self.params.steps();
        let block = traces * steps;
        let total = seeds
            .len()
            .checked_mul(block)
            .ok_or_else(|| SamplingError::InvalidParameters {
                reason: format!("{} seeds of {block} steps each overflow usize", seeds.len()),
            })?;
        let mut data = vec![0_usize; total];
        data.par_chunks_mut(block)
            .zip(seeds.par_iter())
            .enumerate()
            .try_for_each(|(index, (chunk, &seed))| self.walk_seed(graph, seed, index, chunk))?;

        info!(walks = seeds.len() * traces, "random walks completed");
        Ok(WalkTraces {
            data,
            seeds: seeds.len(),
            traces,
            steps,
        })
    }

    fn walk_seed<G>(&self, graph: &G, seed: usize, index: usize, chunk: &mut [usize]) -> Result<()>
    where
        G: GraphView + ?Sized,
    {
        let mut rng = task_rng(self.params.rng_seed, index);
        let steps = self.params.steps();
        for trace in chunk.chunks_mut(steps) {
            let mut current = seed;
            for (step, slot) in trace.iter_mut().enumerate() {
                *slot = current;
                if step + 1 == steps {
                    break;
                }
                let successors = graph.successors(current)?;
                if successors.is_empty() {
                    match self.params.dead_end {
                        DeadEndPolicy::Stay => continue,
                        DeadEndPolicy::Fail => {
                            return Err(SamplingError::DeadEnd {
                                seed,
                                node: current,
                                step,
                            });
                        }
                    }
                }
                current = successors[rng.gen_range(0..successors.len())];
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{graph::CsrGraph, test_utils::suite_proptest_config};

    /// Path `0 -> 1 -> 2` with a dead end at 2.
    #[fixture]
    fn path() -> CsrGraph {
        CsrGraph::from_edges(3, &[(0, 1), (1, 2)]).expect("valid graph")
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    #[case(u64::MAX)]
    fn single_successor_chain_is_deterministic(path: CsrGraph, #[case] seed: u64) {
        let params = WalkParams::new(1, 2).expect("valid").with_rng_seed(seed);
        let traces = RandomWalker::new(params).walk(&path, &[0]).expect("walk");
        assert_eq!(traces.shape(), (1, 1, 3));
        assert_eq!(traces.as_slice(), &[0, 1, 2]);
    }

    #[rstest]
    fn dead_end_fails_by_default(path: CsrGraph) {
        let params = WalkParams::new(1, 3).expect("valid").with_rng_seed(1);
        let err = RandomWalker::new(params)
            .walk(&path, &[0])
            .expect_err("vertex 2 has no successors");
        assert_eq!(
            err,
            SamplingError::DeadEnd {
                seed: 0,
                node: 2,
                step: 2
            }
        );
    }

    #[rstest]
    fn dead_end_stay_holds_position(path: CsrGraph) {
        let params = WalkParams::new(2, 4)
            .expect("valid")
            .with_dead_end_policy(DeadEndPolicy::Stay);
        let traces = RandomWalker::new(params).walk(&path, &[1, 2]).expect("walk");
        assert_eq!(traces.trace(0, 1), Some(&[1, 2, 2, 2, 2][..]));
        assert_eq!(traces.trace(1, 0), Some(&[2, 2, 2, 2, 2][..]));
        assert_eq!(traces.trace(2, 0), None);
    }

    #[rstest]
    fn last_step_ignores_missing_successors(path: CsrGraph) {
        let params = WalkParams::new(3, 0).expect("valid");
        let traces = RandomWalker::new(params).walk(&path, &[2]).expect("walk");
        assert_eq!(traces.as_slice(), &[2, 2, 2]);
    }

    #[rstest]
    fn seeds_are_validated(path: CsrGraph) {
        let walker = RandomWalker::new(WalkParams::new(1, 1).expect("valid"));
        assert_eq!(walker.walk(&path, &[]), Err(SamplingError::EmptySeeds));
        assert_eq!(
            walker.walk(&path, &[0, 3]),
            Err(SamplingError::UnknownSeed {
                node: 3,
                node_count: 3
            })
        );
    }

    #[rstest]
    #[case::zero_traces(0, 3)]
    #[case::hops_overflow(1, usize::MAX)]
    #[case::block_overflow(usize::MAX / 2, 3)]
    fn invalid_walk_params_are_rejected(#[case] traces: usize, #[case] hops: usize) {
        assert!(matches!(
            WalkParams::new(traces, hops),
            Err(SamplingError::InvalidParameters { .. })
        ));
    }

    #[rstest]
    fn oversized_output_is_rejected_before_allocating(path: CsrGraph) {
        let params = WalkParams::new(usize::MAX / 4, 0).expect("block fits");
        let result = RandomWalker::new(params).walk(&path, &[0, 1, 2, 0, 1]);
        assert!(matches!(result, Err(SamplingError::InvalidParameters { .. })));
    }

    #[test]
    fn fixed_seed_is_independent_of_pool_size() {
        let edges: Vec<_> = (0..16)
            .flat_map(|v| [(v, (v + 1) % 16), (v, (v + 5) % 16), (v, (v * 3) % 16)])
            .collect();
        let graph = CsrGraph::from_edges(16, &edges).expect("valid graph");
        let seeds: Vec<_> = (0..16).collect();
        let params = WalkParams::new(4, 12).expect("valid").with_rng_seed(99);
        let run = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .expect("pool")
                .install(|| RandomWalker::new(params.clone()).walk(&graph, &seeds))
                .expect("walk")
        };
        assert_eq!(run(1), run(4));
    }

    proptest! {
        #![proptest_config(suite_proptest_config(64))]

        #[test]
        fn every_step_follows_an_edge(
            edges in prop::collection::vec((0_usize..12, 0_usize..12), 1..48),
            seeds in prop::collection::vec(0_usize..12, 1..6),
            hops in 0_usize..8,
            rng_seed in any::<u64>(),
        ) {
            let graph = CsrGraph::from_edges(12, &edges).expect("valid graph");
            let params = WalkParams::new(3, hops)
                .expect("valid")
                .with_dead_end_policy(DeadEndPolicy::Stay)
                .with_rng_seed(rng_seed);
            let traces = RandomWalker::new(params).walk(&graph, &seeds).expect("walk");
            prop_assert_eq!(traces.shape(), (seeds.len(), 3, hops + 1));
            for (i, &seed) in seeds.iter().enumerate() {
                for j in 0..3 {
                    let trace = traces.trace(i, j).expect("trace");
                    prop_assert_eq!(trace[0], seed);
                    for pair in trace.windows(2) {
                        let successors = graph.successors(pair[0]).expect("row");
                        if successors.is_empty() {
                            prop_assert_eq!(pair[1], pair[0]);
                        } else {
                            prop_assert!(successors.contains(&pair[1]));
                        }
                    }
                }
            }
        }
    }
}
