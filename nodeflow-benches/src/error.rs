//! Benchmark setup error type.
//!
//! Setup functions propagate failures with `?` and the bench entry point
//! panics once with the rendered error.

use nodeflow_core::{GraphError, SamplerError, SamplingError};

use crate::graph::SyntheticGraphError;

/// Errors that may occur while preparing benchmark inputs.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic graph generation was misconfigured.
    #[error("synthetic graph generation failed: {0}")]
    Synthetic(#[from] SyntheticGraphError),
    /// Building the CSR graph failed.
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),
    /// Building a categorical sampler failed.
    #[error("sampler construction failed: {0}")]
    Sampler(#[from] SamplerError),
    /// Sampling parameters were rejected.
    #[error("sampling setup failed: {0}")]
    Sampling(#[from] SamplingError),
}
