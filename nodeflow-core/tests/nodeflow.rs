//! End-to-end node flow sampling through the public API.

mod common;

use common::AdjacencyLists;
use nodeflow_core::{
    CsrGraph, EdgeDirection, GraphView, LoaderParams, NodeFlow, NodeFlowLoader, NodeFlowSampler,
    PairOrdering, SamplerKind, SamplingParams,
};
use nodeflow_test_support::fixtures::{DIAMOND_EDGES, DIAMOND_NODES, chorded_ring_edges};
use rstest::{fixture, rstest};

#[fixture]
fn diamond() -> CsrGraph {
    CsrGraph::from_edges(DIAMOND_NODES, &DIAMOND_EDGES).expect("valid graph")
}

fn out_params(hops: usize, max: usize) -> SamplingParams {
    SamplingParams::new(hops, max)
        .expect("valid parameters")
        .with_direction(EdgeDirection::Out)
        .with_rng_seed(17)
}

/// Checks the structural contract every flow must satisfy.
fn assert_well_formed(flow: &NodeFlow) {
    let offsets = flow.layer_offsets();
    assert_eq!(offsets.first(), Some(&0));
    assert_eq!(offsets.last(), Some(&flow.node_count()));
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(flow.flow_offsets().len(), flow.layer_count());
    assert_eq!(flow.flow_offsets().last(), Some(&flow.edge_count()));
    for layer in 0..flow.layer_count() {
        let nodes = flow.layer_nodes(layer).expect("layer exists");
        assert!(nodes.windows(2).all(|w| w[0] < w[1]), "layer {layer} unsorted");
    }
    let csr = flow.graph().csr();
    assert_eq!(csr.row_count(), flow.node_count());
    assert_eq!(csr.edge_ids(), (0..flow.edge_count()).collect::<Vec<_>>());
}

#[rstest]
fn diamond_flow_from_public_api(diamond: CsrGraph) {
    let flow = NodeFlowSampler::new(out_params(2, 10))
        .sample(&diamond, &[0])
        .expect("sample");
    assert_well_formed(&flow);
    assert_eq!(flow.layer_nodes(0), Some(&[3][..]));
    assert_eq!(flow.layer_nodes(1), Some(&[1, 2][..]));
    assert_eq!(flow.seed_layer(), &[0]);
    assert_eq!(flow.layer_offsets(), &[0, 1, 3, 4]);
    // Global edges 2 and 3 feed vertex 3; 0 and 1 leave the seed.
    assert_eq!(flow.flow_edges(0), Some(&[2, 3][..]));
    assert_eq!(flow.flow_edges(1), Some(&[0, 1][..]));
}

#[rstest]
fn custom_graph_view_matches_csr(diamond: CsrGraph) {
    let lists = AdjacencyLists::new(DIAMOND_NODES, &DIAMOND_EDGES);
    for direction in [EdgeDirection::In, EdgeDirection::Out] {
        let params = out_params(3, 2).with_direction(direction);
        let sampler = NodeFlowSampler::new(params);
        assert_eq!(
            sampler.sample(&lists, &[3, 1]).expect("lists"),
            sampler.sample(&diamond, &[3, 1]).expect("csr"),
        );
    }
}

#[rstest]
fn neighbour_cap_bounds_every_row(
    #[values(1, 2, 3)] max: usize,
    #[values(EdgeDirection::In, EdgeDirection::Out)] direction: EdgeDirection,
) {
    let graph = CsrGraph::from_edges(24, &chorded_ring_edges(24, 5)).expect("valid graph");
    let params = out_params(3, max).with_direction(direction);
    let flow = NodeFlowSampler::new(params)
        .sample(&graph, &[0, 7, 13])
        .expect("sample");
    assert_well_formed(&flow);
    let csr = flow.graph().csr();
    assert!((0..csr.row_count()).all(|row| csr.degree(row) <= max));
}

#[rstest]
fn flow_graph_edges_map_back_to_global_edges(diamond: CsrGraph) {
    let flow = NodeFlowSampler::new(out_params(2, 10))
        .sample(&diamond, &[0])
        .expect("sample");
    let graph = flow.graph();
    for local in 0..graph.node_count() {
        let row = graph.row(local).expect("row");
        let source = flow.node_mapping()[local];
        for (&neighbour, &edge) in row.neighbours().iter().zip(row.edges()) {
            let target = flow.node_mapping()[neighbour];
            assert_eq!(DIAMOND_EDGES[flow.edge_mapping()[edge]], (source, target));
        }
    }
}

#[rstest]
#[case::alias(SamplerKind::Alias)]
#[case::cdf(SamplerKind::Cdf)]
#[case::tree(SamplerKind::Tree)]
fn weighted_flow_only_keeps_weighted_neighbours(#[case] kind: SamplerKind) {
    // Every vertex reaches `v + 1` and `v + 2`; exactly one of them is even.
    let graph = CsrGraph::from_edges(32, &chorded_ring_edges(32, 2)).expect("valid graph");
    let probability: Vec<f64> = (0..32).map(|v| if v % 2 == 0 { 1.0 } else { 0.0 }).collect();
    let params = out_params(2, 1)
        .with_sampler_kind(kind)
        .with_pair_ordering(PairOrdering::Paired);
    let flow = NodeFlowSampler::new(params)
        .sample_weighted(&graph, &[4, 9], &probability)
        .expect("sample");
    assert_well_formed(&flow);
    for layer in 0..flow.layer_count() - 1 {
        let nodes = flow.layer_nodes(layer).expect("layer exists");
        assert!(nodes.iter().all(|v| v % 2 == 0), "layer {layer}: {nodes:?}");
    }
    // 4 -> 6 -> 8 and 9 -> 10 -> 12.
    assert_eq!(flow.layer_nodes(1), Some(&[6, 10][..]));
    assert_eq!(flow.layer_nodes(0), Some(&[8, 12][..]));
}

#[rstest]
fn loader_flows_match_direct_sampling_of_each_batch(diamond: CsrGraph) {
    let params = out_params(1, 10);
    let loader = NodeFlowLoader::new(
        &diamond,
        &[0, 1, 2, 3],
        params.clone(),
        LoaderParams::new(2).expect("valid").with_workers(2),
    )
    .expect("loader");
    let flows: Vec<_> = loader.collect::<Result<_, _>>().expect("flows");
    assert_eq!(flows.len(), 2);
    // With a generous cap every neighbour is kept, so the draw is irrelevant.
    let direct = NodeFlowSampler::new(params);
    assert_eq!(flows[0], direct.sample(&diamond, &[0, 1]).expect("direct"));
    assert_eq!(flows[1], direct.sample(&diamond, &[2, 3]).expect("direct"));
}
