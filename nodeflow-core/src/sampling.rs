//! Public sampling entry points.
//!
//! [`NodeFlowSampler`] validates the request, expands the frontier, and
//! assembles the resulting [`NodeFlow`]. [`random_walk`] is a thin wrapper
//! around [`RandomWalker`].

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{info, instrument};

use crate::{
    error::{Result, SamplingError},
    frontier::FrontierExpander,
    graph::GraphView,
    nodeflow::{NodeFlow, assemble},
    params::SamplingParams,
    picker::NeighbourPicker,
    walk::{RandomWalker, WalkParams, WalkTraces},
};

/// Samples layered neighbourhoods around seed vertices.
///
/// # Examples
/// ```
/// use nodeflow_core::{CsrGraph, NodeFlowSampler, SamplingParams};
///
/// let graph = CsrGraph::from_edges(4, &[(1, 0), (2, 0), (3, 1), (3, 2)])?;
/// let sampler = NodeFlowSampler::new(SamplingParams::new(1, 1)?.with_rng_seed(5));
/// let flow = sampler.sample(&graph, &[0])?;
/// // One of the two in-neighbours of vertex 0 is kept.
/// assert_eq!(flow.layer_offsets(), &[0, 1, 2]);
/// assert_eq!(flow.seed_layer(), &[0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct NodeFlowSampler {
    params: SamplingParams,
}

impl NodeFlowSampler {
    /// Creates a sampler with `params`.
    #[must_use]
    pub fn new(params: SamplingParams) -> Self {
        Self { params }
    }

    /// Parameters in use.
    #[rustfmt::skip]
    #[must_use]
    pub fn params(&self) -> &SamplingParams { &self.params }

    /// Samples a [`NodeFlow`] with uniform neighbour selection.
    ///
    /// # Errors
    /// Returns [`SamplingError::EmptySeeds`] or [`SamplingError::UnknownSeed`]
    /// for an invalid seed list, and any error raised while expanding or
    /// assembling.
    pub fn sample<G>(&self, graph: &G, seeds: &[usize]) -> Result<NodeFlow>
    where
        G: GraphView + ?Sized,
    {
        let mut rng = SmallRng::seed_from_u64(self.params.rng_seed());
        self.sample_with_rng(graph, seeds, None, &mut rng)
    }

    /// Samples a [`NodeFlow`] choosing neighbours in proportion to
    /// `probability[neighbour]`.
    ///
    /// # Errors
    /// Returns [`SamplingError::ProbabilityLengthMismatch`] unless
    /// `probability` has one entry per graph vertex, plus the errors of
    /// [`Self::sample`].
    pub fn sample_weighted<G>(
        &self,
        graph: &G,
        seeds: &[usize],
        probability: &[f64],
    ) -> Result<NodeFlow>
    where
        G: GraphView + ?Sized,
    {
        let mut rng = SmallRng::seed_from_u64(self.params.rng_seed());
        self.sample_with_rng(graph, seeds, Some(probability), &mut rng)
    }

    /// Samples with a caller-provided generator; the configured seed is
    /// ignored.
    ///
    /// # Errors
    /// See [`Self::sample`] and [`Self::sample_weighted`].
    #[instrument(
        name = "core.sample",
        err,
        skip(self, graph, seeds, probability, rng),
        fields(
            seeds = seeds.len(),
            hops = self.params.hops(),
            max_neighbours = self.params.max_neighbours(),
            direction = %self.params.direction(),
            sampler = %self.params.sampler_kind(),
            weighted = probability.is_some(),
        ),
    )]
    pub fn sample_with_rng<G, R>(
        &self,
        graph: &G,
        seeds: &[usize],
        probability: Option<&[f64]>,
        rng: &mut R,
    ) -> Result<NodeFlow>
    where
        G: GraphView + ?Sized,
        R: Rng + ?Sized,
    {
        validate_seeds(graph, seeds)?;
        if let Some(probability) = probability {
            if probability.len() != graph.node_count() {
                return Err(SamplingError::ProbabilityLengthMismatch {
                    expected: graph.node_count(),
                    got: probability.len(),
                });
            }
        }

        let picker = NeighbourPicker::new(self.params.max_neighbours())?
            .with_sampler_kind(self.params.sampler_kind())
            .with_pair_ordering(self.params.pair_ordering());
        let mut expander = FrontierExpander::new(self.params.hops(), self.params.direction(), picker);
        let expansion = expander.expand(graph, seeds, probability, rng)?;
        let flow = assemble(expansion, self.params.direction(), graph.is_multigraph())?;
        info!(
            layers = flow.layer_count(),
            vertices = flow.node_count(),
            edges = flow.edge_count(),
            "node flow sampled"
        );
        Ok(flow)
    }
}

/// Rejects empty seed lists and seeds outside the graph.
pub(crate) fn validate_seeds<G>(graph: &G, seeds: &[usize]) -> Result<()>
where
    G: GraphView + ?Sized,
{
    if seeds.is_empty() {
        return Err(SamplingError::EmptySeeds);
    }
    match seeds.iter().find(|&&seed| !graph.has_node(seed)) {
        Some(&node) => Err(SamplingError::UnknownSeed {
            node,
            node_count: graph.node_count(),
        }),
        None => Ok(()),
    }
}

/// Runs `params.traces_per_seed()` uniform random walks from every seed.
///
/// # Errors
/// See [`RandomWalker::walk`].
///
/// # Examples
/// ```
/// use nodeflow_core::{CsrGraph, WalkParams, random_walk};
///
/// let graph = CsrGraph::from_edges(3, &[(0, 1), (1, 2)])?;
/// let traces = random_walk(&graph, &[0], WalkParams::new(1, 2)?)?;
/// assert_eq!(traces.as_slice(), &[0, 1, 2]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn random_walk<G>(graph: &G, seeds: &[usize], params: WalkParams) -> Result<WalkTraces>
where
    G: GraphView + Sync + ?Sized,
{
    RandomWalker::new(params).walk(graph, seeds)
}
