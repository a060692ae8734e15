//! Benchmark support crate for nodeflow.
//!
//! Provides synthetic graphs, weight vectors, and parameter types used by
//! the Criterion benchmarks for categorical sampling, node flow sampling,
//! and random walks.

pub mod error;
pub mod graph;
pub mod params;
