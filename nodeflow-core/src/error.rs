//! Error types for the nodeflow core library.
//!
//! Defines the error enums exposed by the public API, their stable
//! machine-readable codes, and a convenient result alias.

use std::fmt;

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while reading adjacency from a [`crate::GraphView`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphError {
    /// Requested vertex was outside the graph's bounds.
    #[error("vertex {node} is out of bounds for a graph with {node_count} vertices")]
    NodeOutOfBounds {
        /// The requested vertex id.
        node: usize,
        /// Number of vertices in the graph.
        node_count: usize,
    },
    /// An edge endpoint supplied at construction referenced a missing vertex.
    #[error("edge {index} references a vertex outside a graph with {node_count} vertices")]
    EdgeOutOfBounds {
        /// Position of the offending edge in the input list.
        index: usize,
        /// Number of vertices in the graph.
        node_count: usize,
    },
    /// Raw CSR arrays did not describe a valid compressed sparse row layout.
    #[error("malformed CSR: {reason}")]
    MalformedCsr {
        /// Description of the violated layout rule.
        reason: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// Requested vertex was outside the graph's bounds.
        NodeOutOfBounds => NodeOutOfBounds { .. } => "GRAPH_NODE_OUT_OF_BOUNDS",
        /// An edge endpoint referenced a missing vertex.
        EdgeOutOfBounds => EdgeOutOfBounds { .. } => "GRAPH_EDGE_OUT_OF_BOUNDS",
        /// Raw CSR arrays were inconsistent.
        MalformedCsr => MalformedCsr { .. } => "GRAPH_MALFORMED_CSR",
    }
}

/// An error produced by a [`crate::WeightedSampler`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SamplerError {
    /// Every item with positive weight has already been drawn.
    #[error("all {population} items with positive weight have already been drawn")]
    PopulationExhausted {
        /// Number of items in the distribution.
        population: usize,
    },
    /// The distribution carries no probability mass.
    #[error("distribution over {population} items has zero total weight")]
    DegenerateDistribution {
        /// Number of items in the distribution.
        population: usize,
    },
    /// A weight was negative or not finite.
    #[error("weight at index {index} must be finite and non-negative")]
    InvalidWeight {
        /// Position of the rejected weight.
        index: usize,
    },
    /// The distribution contained no items.
    #[error("cannot sample from an empty distribution")]
    EmptyDistribution,
}

define_error_codes! {
    /// Stable codes describing [`SamplerError`] variants.
    enum SamplerErrorCode for SamplerError {
        /// Every item with positive weight has already been drawn.
        PopulationExhausted => PopulationExhausted { .. } => "SAMPLER_POPULATION_EXHAUSTED",
        /// The distribution carries no probability mass.
        DegenerateDistribution => DegenerateDistribution { .. } => "SAMPLER_DEGENERATE_DISTRIBUTION",
        /// A weight was negative or not finite.
        InvalidWeight => InvalidWeight { .. } => "SAMPLER_INVALID_WEIGHT",
        /// The distribution contained no items.
        EmptyDistribution => EmptyDistribution => "SAMPLER_EMPTY_DISTRIBUTION",
    }
}

/// Processing stage reported by [`SamplingError::InvariantViolation`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
    /// Uniform or weighted neighbour selection.
    Pick,
    /// Multi-hop frontier expansion.
    Expand,
    /// NodeFlow assembly.
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pick => "pick",
            Self::Expand => "expand",
            Self::Assemble => "assemble",
        })
    }
}

/// Error type produced by the sampling entry points.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SamplingError {
    /// Parameters were invalid for the requested operation.
    #[error("invalid sampling parameter: {reason}")]
    InvalidParameters {
        /// Description of the rejected parameter.
        reason: String,
    },
    /// No seed vertices were supplied.
    #[error("at least one seed vertex is required")]
    EmptySeeds,
    /// A seed vertex does not exist in the graph.
    #[error("seed vertex {node} does not exist in a graph with {node_count} vertices")]
    UnknownSeed {
        /// The rejected seed vertex.
        node: usize,
        /// Number of vertices in the graph.
        node_count: usize,
    },
    /// The per-vertex probability table does not cover the graph.
    #[error("probability table has {got} entries but the graph has {expected} vertices")]
    ProbabilityLengthMismatch {
        /// Number of vertices in the graph.
        expected: usize,
        /// Length of the supplied table.
        got: usize,
    },
    /// A random walk reached a vertex without successors.
    #[error("walk from seed {seed} reached vertex {node} with no successors at step {step}")]
    DeadEnd {
        /// Seed the walk started from.
        seed: usize,
        /// Vertex without successors.
        node: usize,
        /// Step at which the walk stalled.
        step: usize,
    },
    /// An internal invariant was violated, indicating a logic error.
    #[error("{stage} invariant violated at layer {layer} (vertex {node:?}): {detail}")]
    InvariantViolation {
        /// Stage that detected the violation.
        stage: Stage,
        /// Layer (hop) index being processed.
        layer: usize,
        /// Vertex involved, when one is known.
        node: Option<usize>,
        /// Description of the violated invariant.
        detail: String,
    },
    /// Wrapped [`GraphError`].
    #[error("graph access failed: {0}")]
    Graph(#[from] GraphError),
    /// Wrapped [`SamplerError`].
    #[error("weighted sampler failed: {0}")]
    Sampler(#[from] SamplerError),
}

define_error_codes! {
    /// Stable codes describing [`SamplingError`] variants.
    enum SamplingErrorCode for SamplingError {
        /// Parameters were invalid for the requested operation.
        InvalidParameters => InvalidParameters { .. } => "SAMPLING_INVALID_PARAMETERS",
        /// No seed vertices were supplied.
        EmptySeeds => EmptySeeds => "SAMPLING_EMPTY_SEEDS",
        /// A seed vertex does not exist in the graph.
        UnknownSeed => UnknownSeed { .. } => "SAMPLING_UNKNOWN_SEED",
        /// The per-vertex probability table does not cover the graph.
        ProbabilityLengthMismatch => ProbabilityLengthMismatch { .. } => "SAMPLING_PROBABILITY_LENGTH_MISMATCH",
        /// A random walk reached a vertex without successors.
        DeadEnd => DeadEnd { .. } => "SAMPLING_DEAD_END",
        /// An internal invariant was violated.
        InvariantViolation => InvariantViolation { .. } => "SAMPLING_INVARIANT_VIOLATION",
        /// Graph access failed.
        GraphFailure => Graph(..) => "SAMPLING_GRAPH_FAILURE",
        /// Weighted sampler failed.
        SamplerFailure => Sampler(..) => "SAMPLING_SAMPLER_FAILURE",
    }
}

impl SamplingError {
    /// Retrieve the inner [`GraphErrorCode`] when the error originated in graph access.
    #[must_use]
    pub const fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::Graph(error) => Some(error.code()),
            _ => None,
        }
    }

    /// Retrieve the inner [`SamplerErrorCode`] when the error originated in a sampler.
    #[must_use]
    pub const fn sampler_code(&self) -> Option<SamplerErrorCode> {
        match self {
            Self::Sampler(error) => Some(error.code()),
            _ => None,
        }
    }

    pub(crate) fn invariant(
        stage: Stage,
        layer: usize,
        node: Option<usize>,
        detail: impl Into<String>,
    ) -> Self {
        Self::InvariantViolation {
            stage,
            layer,
            node,
            detail: detail.into(),
        }
    }

    /// Attaches hop and vertex context to an invariant violation raised
    /// without it. Other variants pass through untouched.
    pub(crate) fn at(self, layer: usize, node: usize) -> Self {
        match self {
            Self::InvariantViolation {
                stage,
                node: None,
                detail,
                ..
            } => Self::InvariantViolation {
                stage,
                layer,
                node: Some(node),
                detail,
            },
            other => other,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, SamplingError>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(SamplingError::EmptySeeds, "SAMPLING_EMPTY_SEEDS")]
    #[case(
        SamplingError::DeadEnd { seed: 0, node: 3, step: 1 },
        "SAMPLING_DEAD_END"
    )]
    #[case(
        SamplingError::Graph(GraphError::NodeOutOfBounds { node: 9, node_count: 2 }),
        "SAMPLING_GRAPH_FAILURE"
    )]
    #[case(
        SamplingError::invariant(Stage::Assemble, 1, Some(4), "missing mapping"),
        "SAMPLING_INVARIANT_VIOLATION"
    )]
    fn sampling_error_codes_are_stable(#[case] error: SamplingError, #[case] code: &str) {
        assert_eq!(error.code().as_str(), code);
        assert_eq!(error.code().to_string(), code);
    }

    #[test]
    fn nested_codes_are_exposed() {
        let error = SamplingError::from(SamplerError::PopulationExhausted { population: 3 });
        assert_eq!(
            error.sampler_code(),
            Some(SamplerErrorCode::PopulationExhausted)
        );
        assert_eq!(error.graph_code(), None);

        let error = SamplingError::from(GraphError::MalformedCsr {
            reason: "indptr must start at zero".into(),
        });
        assert_eq!(error.graph_code(), Some(GraphErrorCode::MalformedCsr));
    }

    #[test]
    fn invariant_violation_reports_context() {
        let error = SamplingError::invariant(Stage::Expand, 2, Some(7), "layer size mismatch");
        assert_eq!(
            error.to_string(),
            "expand invariant violated at layer 2 (vertex Some(7)): layer size mismatch"
        );
    }
}
