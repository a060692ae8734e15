//! Synthetic directed graphs and weight tables for benchmarking.
//!
//! Targets are drawn so that a small set of hub vertices collects most
//! in-edges. Hubs give the in-direction picker rows much longer than the
//! neighbour cap, which is the case worth measuring.

use nodeflow_core::CsrGraph;
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Errors raised by synthetic graph configuration checks.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SyntheticGraphError {
    /// The graph would have no vertices.
    #[error("node_count must be greater than zero")]
    ZeroNodes,
    /// The hub set would be empty or exceed the vertex count.
    #[error("hub_count must be in 1..={node_count}, got {hub_count}")]
    InvalidHubCount {
        /// Requested hub count.
        hub_count: usize,
        /// Number of vertices.
        node_count: usize,
    },
    /// `node_count * out_degree` does not fit in `usize`.
    #[error("edge count overflows usize")]
    EdgeCountOverflow,
}

/// Shape of a synthetic hub-heavy graph.
#[derive(Clone, Debug)]
pub struct SyntheticGraphConfig {
    /// Number of vertices.
    pub node_count: usize,
    /// Out-edges emitted per vertex.
    pub out_degree: usize,
    /// Vertices `0..hub_count` receive half of all edges.
    pub hub_count: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// Generates the `(source, target)` list described by `config`.
///
/// # Errors
/// Returns [`SyntheticGraphError`] when the configuration is invalid.
pub fn synthetic_edges(
    config: &SyntheticGraphConfig,
) -> Result<Vec<(usize, usize)>, SyntheticGraphError> {
    if config.node_count == 0 {
        return Err(SyntheticGraphError::ZeroNodes);
    }
    if config.hub_count == 0 || config.hub_count > config.node_count {
        return Err(SyntheticGraphError::InvalidHubCount {
            hub_count: config.hub_count,
            node_count: config.node_count,
        });
    }
    let total = config
        .node_count
        .checked_mul(config.out_degree)
        .ok_or(SyntheticGraphError::EdgeCountOverflow)?;

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut edges = Vec::with_capacity(total);
    for src in 0..config.node_count {
        for _ in 0..config.out_degree {
            let dst = if rng.gen_bool(0.5) {
                rng.gen_range(0..config.hub_count)
            } else {
                rng.gen_range(0..config.node_count)
            };
            edges.push((src, dst));
        }
    }
    Ok(edges)
}

/// Builds a [`CsrGraph`] from [`synthetic_edges`].
///
/// # Errors
/// Returns [`crate::error::BenchSetupError`] when generation or CSR
/// construction fails.
pub fn synthetic_graph(
    config: &SyntheticGraphConfig,
) -> Result<CsrGraph, crate::error::BenchSetupError> {
    let edges = synthetic_edges(config)?;
    Ok(CsrGraph::from_edges(config.node_count, &edges)?)
}

/// Non-negative weights in `[0, 1)`, with roughly one in eight set to zero.
#[must_use]
pub fn synthetic_weights(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            if rng.gen_ratio(1, 8) {
                0.0
            } else {
                rng.gen_range(0.0..1.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use nodeflow_core::{EdgeDirection, GraphView};
    use rstest::rstest;

    use super::*;

    fn config(node_count: usize, hub_count: usize) -> SyntheticGraphConfig {
        SyntheticGraphConfig {
            node_count,
            out_degree: 4,
            hub_count,
            seed: 7,
        }
    }

    #[rstest]
    #[case::no_nodes(config(0, 1), SyntheticGraphError::ZeroNodes)]
    #[case::no_hubs(
        config(10, 0),
        SyntheticGraphError::InvalidHubCount { hub_count: 0, node_count: 10 }
    )]
    #[case::too_many_hubs(
        config(10, 11),
        SyntheticGraphError::InvalidHubCount { hub_count: 11, node_count: 10 }
    )]
    fn rejects_invalid_configs(
        #[case] config: SyntheticGraphConfig,
        #[case] expected: SyntheticGraphError,
    ) {
        assert_eq!(synthetic_edges(&config), Err(expected));
    }

    #[test]
    fn hubs_collect_long_in_rows() {
        let graph = synthetic_graph(&config(1_000, 10)).expect("valid config");
        assert_eq!(graph.edge_count(), 4_000);
        let hub_degree = graph
            .adjacency(0, EdgeDirection::In)
            .expect("hub exists")
            .len();
        assert!(hub_degree > 100, "hub in-degree {hub_degree}");
    }

    #[test]
    fn generation_is_reproducible() {
        assert_eq!(
            synthetic_edges(&config(50, 5)),
            synthetic_edges(&config(50, 5))
        );
        assert_eq!(synthetic_weights(64, 3), synthetic_weights(64, 3));
        assert!(synthetic_weights(64, 3).iter().all(|w| (0.0..1.0).contains(w)));
    }
}
