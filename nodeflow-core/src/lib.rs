//! Nodeflow core library.
//!
//! Weighted graph-neighbourhood sampling: categorical samplers, bounded
//! neighbour picking, multi-hop frontier expansion, node flow assembly, and
//! parallel random walks over any [`GraphView`].
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod frontier;
mod graph;
mod loader;
mod nodeflow;
mod params;
mod picker;
mod sampler;
mod sampling;
mod seed;
mod walk;

#[cfg(test)]
mod test_utils;

pub use crate::{
    error::{
        GraphError, GraphErrorCode, Result, SamplerError, SamplerErrorCode, SamplingError,
        SamplingErrorCode, Stage,
    },
    frontier::{
        ArenaSpan, Expansion, Frontier, FrontierEntry, FrontierExpander, NeighbourArena,
        NeighbourRecord,
    },
    graph::{AdjacencySlice, Csr, CsrGraph, EdgeDirection, GraphView},
    loader::{LoaderParams, NodeFlowLoader},
    nodeflow::{FlowGraph, NodeFlow, assemble},
    params::SamplingParams,
    picker::{NeighbourPicker, PairOrdering, PickedNeighbours},
    sampler::{
        AliasSampler, CategoricalSampler, CdfSampler, Replacement, SamplerKind, TreeSampler,
        WeightedSampler,
    },
    sampling::{NodeFlowSampler, random_walk},
    walk::{DeadEndPolicy, RandomWalker, WalkParams, WalkTraces},
};
