//! Parameter handling for neighbourhood sampling.

use crate::{
    error::{Result, SamplingError},
    graph::EdgeDirection,
    picker::PairOrdering,
    sampler::SamplerKind,
    seed::entropy_seed,
};

/// Configuration for [`crate::NodeFlowSampler`].
///
/// Defaults follow in-edges, sample weighted rows with the sum-tree
/// sampler, keep weighted `(neighbour, edge)` pairs together, and draw the
/// base seed from OS entropy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplingParams {
    hops: usize,
    max_neighbours: usize,
    direction: EdgeDirection,
    sampler_kind: SamplerKind,
    pair_ordering: PairOrdering,
    rng_seed: u64,
}

impl SamplingParams {
    /// Creates a parameter set expanding `hops` hops and keeping at most
    /// `max_neighbours` neighbours per vertex and hop.
    ///
    /// # Errors
    /// Returns [`SamplingError::InvalidParameters`] when `max_neighbours` is
    /// zero.
    ///
    /// # Examples
    /// ```
    /// use nodeflow_core::{EdgeDirection, SamplingParams};
    ///
    /// let params = SamplingParams::new(2, 10).expect("parameters must be valid");
    /// assert_eq!(params.hops(), 2);
    /// assert_eq!(params.direction(), EdgeDirection::In);
    /// assert!(SamplingParams::new(2, 0).is_err());
    /// ```
    pub fn new(hops: usize, max_neighbours: usize) -> Result<Self> {
        if max_neighbours == 0 {
            return Err(SamplingError::InvalidParameters {
                reason: "max_neighbours must be greater than zero".into(),
            });
        }
        Ok(Self {
            hops,
            max_neighbours,
            direction: EdgeDirection::default(),
            sampler_kind: SamplerKind::default(),
            pair_ordering: PairOrdering::default(),
            rng_seed: entropy_seed(),
        })
    }

    /// Chooses whether neighbours are taken from in-edges or out-edges.
    #[must_use]
    pub fn with_direction(mut self, direction: EdgeDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Chooses the weighted sampling algorithm.
    #[must_use]
    pub fn with_sampler_kind(mut self, kind: SamplerKind) -> Self {
        self.sampler_kind = kind;
        self
    }

    /// Chooses how weighted picks are ordered.
    #[must_use]
    pub fn with_pair_ordering(mut self, ordering: PairOrdering) -> Self {
        self.pair_ordering = ordering;
        self
    }

    /// Seeds the internal RNG to make sampling deterministic.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Returns the number of hops expanded beyond the seeds.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.hops
    }

    /// Returns the per-vertex neighbour bound.
    #[must_use]
    pub fn max_neighbours(&self) -> usize {
        self.max_neighbours
    }

    /// Edge direction followed from each vertex.
    #[must_use]
    pub fn direction(&self) -> EdgeDirection {
        self.direction
    }

    /// Algorithm used for weighted picks.
    #[must_use]
    pub fn sampler_kind(&self) -> SamplerKind {
        self.sampler_kind
    }

    /// Ordering of weighted picks.
    #[must_use]
    pub fn pair_ordering(&self) -> PairOrdering {
        self.pair_ordering
    }

    /// Base seed for per-task generators.
    #[must_use]
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}
