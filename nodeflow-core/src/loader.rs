//! Batched node flow loading.
//!
//! [`NodeFlowLoader`] splits a seed list into fixed-size batches and yields
//! one [`NodeFlow`] per batch. Batches are sampled `workers` at a time on the
//! rayon pool and buffered until consumed. Batch `i` always uses the
//! generator derived from the base seed and `i`, so the sequence of flows
//! for a fixed seed does not depend on `workers`.

use std::collections::VecDeque;

use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::{
    error::{Result, SamplingError},
    graph::GraphView,
    nodeflow::NodeFlow,
    params::SamplingParams,
    sampling::{NodeFlowSampler, validate_seeds},
    seed::task_rng,
};

/// Batching configuration for [`NodeFlowLoader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoaderParams {
    batch_size: usize,
    shuffle: bool,
    workers: usize,
}

impl LoaderParams {
    /// Creates loader parameters yielding batches of `batch_size` seeds,
    /// unshuffled, sampled one batch at a time.
    ///
    /// # Errors
    /// Returns [`SamplingError::InvalidParameters`] when `batch_size` is zero.
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(SamplingError::InvalidParameters {
                reason: "batch_size must be greater than zero".into(),
            });
        }
        Ok(Self {
            batch_size,
            shuffle: false,
            workers: 1,
        })
    }

    /// Shuffles the seed list once before batching.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Number of batches sampled concurrently per prefetch round. Zero is
    /// treated as one.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Seeds per batch; the last batch may be shorter.
    #[rustfmt::skip]
    #[must_use]
    pub fn batch_size(&self) -> usize { self.batch_size }

    /// Whether seeds are shuffled before batching.
    #[rustfmt::skip]
    #[must_use]
    pub fn shuffle(&self) -> bool { self.shuffle }

    /// Batches sampled in parallel per prefetch round.
    #[rustfmt::skip]
    #[must_use]
    pub fn workers(&self) -> usize { self.workers }
}

/// Iterator over the node flows of successive seed batches.
///
/// # Examples
/// ```
/// use nodeflow_core::{CsrGraph, LoaderParams, NodeFlowLoader, SamplingParams};
///
/// let graph = CsrGraph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)])?;
/// let sampling = SamplingParams::new(1, 2)?.with_rng_seed(3);
/// let loader = NodeFlowLoader::new(&graph, &[0, 1, 2, 3, 0], sampling, LoaderParams::new(2)?)?;
/// let flows = loader.collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(flows.len(), 3);
/// assert_eq!(flows[2].seed_layer(), &[0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct NodeFlowLoader<'g, G: ?Sized> {
    graph: &'g G,
    sampler: NodeFlowSampler,
    probability: Option<&'g [f64]>,
    batches: Vec<Vec<usize>>,
    workers: usize,
    next_batch: usize,
    ready: VecDeque<Result<NodeFlow>>,
}

impl<'g, G> NodeFlowLoader<'g, G>
where
    G: GraphView + Sync + ?Sized,
{
    /// Prepares the batches of `seeds`.
    ///
    /// # Errors
    /// Returns [`SamplingError::EmptySeeds`] or [`SamplingError::UnknownSeed`]
    /// for an invalid seed list.
    pub fn new(
        graph: &'g G,
        seeds: &[usize],
        sampling: SamplingParams,
        loader: LoaderParams,
    ) -> Result<Self> {
        validate_seeds(graph, seeds)?;
        let mut order = seeds.to_vec();
        if loader.shuffle {
            order.shuffle(&mut SmallRng::seed_from_u64(sampling.rng_seed()));
        }
        let batches = order
            .chunks(loader.batch_size)
            .map(<[usize]>::to_vec)
            .collect();
        Ok(Self {
            graph,
            sampler: NodeFlowSampler::new(sampling),
            probability: None,
            batches,
            workers: loader.workers,
            next_batch: 0,
            ready: VecDeque::new(),
        })
    }

    /// Samples neighbours by `probability[neighbour]` instead of uniformly.
    ///
    /// # Errors
    /// Returns [`SamplingError::ProbabilityLengthMismatch`] unless
    /// `probability` has one entry per graph vertex.
    pub fn with_probability(mut self, probability: &'g [f64]) -> Result<Self> {
        if probability.len() != self.graph.node_count() {
            return Err(SamplingError::ProbabilityLengthMismatch {
                expected: self.graph.node_count(),
                got: probability.len(),
            });
        }
        self.probability = Some(probability);
        Ok(self)
    }

    /// Total number of batches.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Seeds of batch `index`, after shuffling.
    #[must_use]
    pub fn batch(&self, index: usize) -> Option<&[usize]> {
        self.batches.get(index).map(Vec::as_slice)
    }

    #[instrument(
        name = "core.loader.prefetch",
        skip(self),
        fields(first_batch = self.next_batch, workers = self.workers),
    )]
    fn prefetch(&mut self) {
        let first = self.next_batch;
        let end = (first + self.workers).min(self.batches.len());
        let base_seed = self.sampler.params().rng_seed();
        let (graph, sampler, probability) = (self.graph, &self.sampler, self.probability);
        let flows: Vec<_> = self.batches[first..end]
            .par_iter()
            .enumerate()
            .map(|(offset, seeds)| {
                let mut rng = task_rng(base_seed, first + offset);
                sampler.sample_with_rng(graph, seeds, probability, &mut rng)
            })
            .collect();
        debug!(batches = flows.len(), "batches prefetched");
        self.ready.extend(flows);
        self.next_batch = end;
    }
}

impl<G> Iterator for NodeFlowLoader<'_, G>
where
    G: GraphView + Sync + ?Sized,
{
    type Item = Result<NodeFlow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ready.is_empty() && self.next_batch < self.batches.len() {
            self.prefetch();
        }
        self.ready.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ready.len() + self.batches.len() - self.next_batch;
        (remaining, Some(remaining))
    }
}

impl<G> ExactSizeIterator for NodeFlowLoader<'_, G> where G: GraphView + Sync + ?Sized {}
