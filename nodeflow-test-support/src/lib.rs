//! Shared test utilities used across nodeflow crates.

pub mod ci;
pub mod fixtures;
pub mod tracing;
