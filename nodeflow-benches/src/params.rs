//! Benchmark parameter types, rendered as Criterion benchmark ids.

use std::fmt;

use nodeflow_core::SamplerKind;

/// Parameters for a categorical sampler run.
#[derive(Clone, Copy, Debug)]
pub struct SamplerBenchParams {
    /// Algorithm under test.
    pub kind: SamplerKind,
    /// Number of weighted items.
    pub population: usize,
}

impl fmt::Display for SamplerBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},n={}", self.kind, self.population)
    }
}

/// Parameters for a node flow sampling run.
#[derive(Clone, Copy, Debug)]
pub struct NodeFlowBenchParams {
    /// Number of seed vertices per flow.
    pub seeds: usize,
    /// Number of hops.
    pub hops: usize,
    /// Per-vertex neighbour cap.
    pub max_neighbours: usize,
}

impl fmt::Display for NodeFlowBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seeds={},hops={},k={}",
            self.seeds, self.hops, self.max_neighbours
        )
    }
}

/// Parameters for a random walk run.
#[derive(Clone, Copy, Debug)]
pub struct WalkBenchParams {
    /// Number of seed vertices.
    pub seeds: usize,
    /// Walk length in hops.
    pub hops: usize,
}

impl fmt::Display for WalkBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seeds={},hops={}", self.seeds, self.hops)
    }
}
