//! Layered, reindexed sampled subgraphs.
//!
//! [`assemble`] turns an [`Expansion`] into a [`NodeFlow`]. Output layers are
//! the frontier layers in reverse, so the most distant hop comes first and
//! the seeds form the last block of rows. Every layer is sorted by global id
//! before local ids are handed out, which makes [`NodeFlow::local_id`] a
//! binary search.

use std::{collections::HashMap, ops::Range};

use tracing::{debug, instrument};

use crate::{
    error::{GraphError, Result, SamplingError, Stage},
    frontier::Expansion,
    graph::{AdjacencySlice, Csr, EdgeDirection, GraphView},
};

/// CSR adjacency over the local ids of a [`NodeFlow`].
///
/// Rows hold the sampled neighbours of each vertex. With
/// [`EdgeDirection::Out`] a row lists the targets of the row vertex's edges;
/// with [`EdgeDirection::In`] it lists their sources. Local edge ids are the
/// CSR positions `0..edge_count`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlowGraph {
    csr: Csr,
    transposed: Csr,
    direction: EdgeDirection,
    multigraph: bool,
}

impl FlowGraph {
    fn new(csr: Csr, direction: EdgeDirection, multigraph: bool) -> Result<Self> {
        let transposed = csr.transpose()?;
        Ok(Self {
            csr,
            transposed,
            direction,
            multigraph,
        })
    }

    /// Stored CSR, rows in local-id order.
    #[rustfmt::skip]
    #[must_use]
    pub fn csr(&self) -> &Csr { &self.csr }

    /// Orientation of [`Self::csr`].
    #[rustfmt::skip]
    #[must_use]
    pub fn direction(&self) -> EdgeDirection { self.direction }

    /// Sampled neighbours of local vertex `row` as stored.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] when `row` does not exist.
    pub fn row(&self, row: usize) -> std::result::Result<AdjacencySlice<'_>, GraphError> {
        self.csr.row(row)
    }

    /// Number of sampled neighbours stored for `row`.
    #[must_use]
    pub fn degree(&self, row: usize) -> usize {
        self.csr.degree(row)
    }

    /// Local vertices with an edge into `node`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] when `node` does not exist.
    pub fn predecessors(&self, node: usize) -> std::result::Result<&[usize], GraphError> {
        Ok(self.adjacency(node, EdgeDirection::In)?.neighbours())
    }
}

impl GraphView for FlowGraph {
    fn node_count(&self) -> usize {
        self.csr.row_count()
    }

    fn is_multigraph(&self) -> bool {
        self.multigraph
    }

    fn adjacency(
        &self,
        node: usize,
        direction: EdgeDirection,
    ) -> std::result::Result<AdjacencySlice<'_>, GraphError> {
        if direction == self.direction {
            self.csr.row(node)
        } else {
            self.transposed.row(node)
        }
    }
}

/// Sampled multi-layer computation graph with its id mappings.
///
/// # Examples
/// ```
/// use nodeflow_core::{CsrGraph, EdgeDirection, NodeFlowSampler, SamplingParams};
///
/// let graph = CsrGraph::from_edges(5, &[(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)])?;
/// let params = SamplingParams::new(2, 10)?
///     .with_direction(EdgeDirection::Out)
///     .with_rng_seed(1);
/// let flow = NodeFlowSampler::new(params).sample(&graph, &[0])?;
/// assert_eq!(flow.layer_offsets(), &[0, 1, 3, 4]);
/// assert_eq!(flow.layer_nodes(0), Some(&[3][..]));
/// assert_eq!(flow.layer_nodes(1), Some(&[1, 2][..]));
/// assert_eq!(flow.seed_layer(), &[0]);
/// assert_eq!(flow.flow_offsets(), &[0, 2, 4]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeFlow {
    node_mapping: Vec<usize>,
    edge_mapping: Vec<usize>,
    layer_offsets: Vec<usize>,
    flow_offsets: Vec<usize>,
    graph: FlowGraph,
}

impl NodeFlow {
    /// Global vertex id of each local vertex.
    #[rustfmt::skip]
    #[must_use]
    pub fn node_mapping(&self) -> &[usize] { &self.node_mapping }

    /// Global edge id of each local edge.
    #[rustfmt::skip]
    #[must_use]
    pub fn edge_mapping(&self) -> &[usize] { &self.edge_mapping }

    /// Cumulative vertex counts per output layer, starting at `0`.
    #[rustfmt::skip]
    #[must_use]
    pub fn layer_offsets(&self) -> &[usize] { &self.layer_offsets }

    /// Cumulative edge counts per layer transition, starting at `0`.
    #[rustfmt::skip]
    #[must_use]
    pub fn flow_offsets(&self) -> &[usize] { &self.flow_offsets }

    /// Reindexed flow graph over local ids.
    #[rustfmt::skip]
    #[must_use]
    pub fn graph(&self) -> &FlowGraph { &self.graph }

    /// Number of output layers, seeds included.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layer_offsets.len().saturating_sub(1)
    }

    /// Number of flows between consecutive layers.
    #[must_use]
    pub fn flow_count(&self) -> usize {
        self.flow_offsets.len().saturating_sub(1)
    }

    /// Total vertices over all layers.
    #[rustfmt::skip]
    #[must_use]
    pub fn node_count(&self) -> usize { self.node_mapping.len() }

    /// Total sampled edges over all flows.
    #[rustfmt::skip]
    #[must_use]
    pub fn edge_count(&self) -> usize { self.edge_mapping.len() }

    /// Local id range of output layer `layer`.
    #[must_use]
    pub fn layer_range(&self, layer: usize) -> Option<Range<usize>> {
        offsets_range(&self.layer_offsets, layer)
    }

    /// Global ids of output layer `layer`, ascending.
    #[must_use]
    pub fn layer_nodes(&self, layer: usize) -> Option<&[usize]> {
        self.layer_range(layer)
            .map(|range| &self.node_mapping[range])
    }

    /// Local edge id range of flow `flow`, the edges from the rows of layer
    /// `flow + 1` into layer `flow`.
    #[must_use]
    pub fn flow_range(&self, flow: usize) -> Option<Range<usize>> {
        offsets_range(&self.flow_offsets, flow)
    }

    /// Global edge ids of flow `flow`.
    #[must_use]
    pub fn flow_edges(&self, flow: usize) -> Option<&[usize]> {
        self.flow_range(flow).map(|range| &self.edge_mapping[range])
    }

    /// Global ids of the seed vertices, ascending.
    #[must_use]
    pub fn seed_layer(&self) -> &[usize] {
        self.layer_count()
            .checked_sub(1)
            .and_then(|last| self.layer_nodes(last))
            .unwrap_or_default()
    }

    /// Local id of global vertex `global` within output layer `layer`.
    #[must_use]
    pub fn local_id(&self, layer: usize, global: usize) -> Option<usize> {
        let range = self.layer_range(layer)?;
        let start = range.start;
        self.node_mapping[range]
            .binary_search(&global)
            .ok()
            .map(|offset| start + offset)
    }
}

fn offsets_range(offsets: &[usize], index: usize) -> Option<Range<usize>> {
    let start = *offsets.get(index)?;
    let end = *offsets.get(index + 1)?;
    Some(start..end)
}

/// Builds a [`NodeFlow`] from an expansion.
///
/// `direction` is the direction the expansion followed and becomes the
/// orientation of the returned [`FlowGraph`]; `multigraph` is copied from the
/// source graph.
///
/// # Errors
/// Returns [`SamplingError::InvariantViolation`] when the expansion is not
/// internally consistent: a record does not match its frontier entry, a
/// sampled neighbour is missing from the next layer, a layer holds a vertex
/// twice, or the emitted vertex or edge totals disagree with the expansion.
#[instrument(
    name = "core.assemble",
    err,
    skip(expansion),
    fields(
        layers = expansion.frontier().layer_count(),
        vertices = expansion.frontier().len(),
        edges = expansion.edge_count(),
    ),
)]
pub fn assemble(
    expansion: Expansion,
    direction: EdgeDirection,
    multigraph: bool,
) -> Result<NodeFlow> {
    let frontier = expansion.frontier();
    let entries = frontier.entries();
    let layers = frontier.layer_count();
    if layers == 0 {
        return Err(SamplingError::invariant(
            Stage::Assemble,
            0,
            None,
            "expansion has no layers",
        ));
    }
    let expanded = frontier.layer_offsets()[layers - 1];
    if expansion.records().len() != expanded {
        return Err(SamplingError::invariant(
            Stage::Assemble,
            layers - 1,
            None,
            format!(
                "{} neighbour records for {expanded} expanded vertices",
                expansion.records().len()
            ),
        ));
    }

    // Frontier layer `layer` becomes output layer `layers - 1 - layer`.
    let mut node_mapping = Vec::with_capacity(entries.len());
    let mut layer_offsets = Vec::with_capacity(layers + 1);
    layer_offsets.push(0);
    let mut sorted_layers: Vec<Vec<usize>> = vec![Vec::new(); layers];
    let mut local_ids: Vec<HashMap<usize, usize>> = vec![HashMap::new(); layers];
    for layer in (0..layers).rev() {
        let range = frontier.layer_range(layer).unwrap_or_default();
        let mut order: Vec<usize> = range.collect();
        order.sort_unstable_by_key(|&index| entries[index].node);
        let ids = &mut local_ids[layer];
        ids.reserve(order.len());
        for &index in &order {
            let node = entries[index].node;
            if ids.insert(node, node_mapping.len()).is_some() {
                return Err(SamplingError::invariant(
                    Stage::Assemble,
                    layer,
                    Some(node),
                    "vertex appears twice in one layer",
                ));
            }
            node_mapping.push(node);
        }
        layer_offsets.push(node_mapping.len());
        sorted_layers[layer] = order;
    }
    if node_mapping.len() != entries.len() {
        return Err(SamplingError::invariant(
            Stage::Assemble,
            0,
            None,
            format!(
                "emitted {} vertices for a frontier of {}",
                node_mapping.len(),
                entries.len()
            ),
        ));
    }

    let mut indptr = Vec::with_capacity(node_mapping.len() + 1);
    indptr.push(0);
    let mut indices = Vec::with_capacity(expansion.edge_count());
    let mut edge_mapping = Vec::with_capacity(expansion.edge_count());
    // The outermost layer is never expanded and contributes empty rows.
    let outermost = sorted_layers[layers - 1].len();
    indptr.resize(outermost + 1, 0);
    for layer in (0..layers - 1).rev() {
        let next_ids = &local_ids[layer + 1];
        for &index in &sorted_layers[layer] {
            let record = expansion.records()[index];
            let node = entries[index].node;
            if record.node != node {
                return Err(SamplingError::invariant(
                    Stage::Assemble,
                    layer,
                    Some(node),
                    format!("record belongs to vertex {}", record.node),
                ));
            }
            let row = expansion.arena().slice(record.span).ok_or_else(|| {
                SamplingError::invariant(
                    Stage::Assemble,
                    layer,
                    Some(node),
                    "neighbour span lies outside the arena",
                )
            })?;
            for (&neighbour, &edge) in row.neighbours().iter().zip(row.edges()) {
                let local = next_ids.get(&neighbour).copied().ok_or_else(|| {
                    SamplingError::invariant(
                        Stage::Assemble,
                        layer,
                        Some(neighbour),
                        format!("neighbour of {node} missing from layer {}", layer + 1),
                    )
                })?;
                indices.push(local);
                edge_mapping.push(edge);
            }
            indptr.push(indices.len());
        }
    }
    if indices.len() != expansion.edge_count() {
        return Err(SamplingError::invariant(
            Stage::Assemble,
            0,
            None,
            format!(
                "emitted {} edges but {} were sampled",
                indices.len(),
                expansion.edge_count()
            ),
        ));
    }

    // Flow `i` holds the edges of the rows of output layer `i + 1`.
    let mut flow_offsets = Vec::with_capacity(layers);
    flow_offsets.push(0);
    for window in layer_offsets.windows(2).skip(1) {
        let edges = indptr[window[1]] - indptr[window[0]];
        let previous = flow_offsets.last().copied().unwrap_or_default();
        flow_offsets.push(previous + edges);
    }

    let edge_ids = (0..indices.len()).collect();
    let csr = Csr::from_parts(indptr, indices, edge_ids)?;
    let graph = FlowGraph::new(csr, direction, multigraph)?;
    debug!(
        vertices = node_mapping.len(),
        edges = edge_mapping.len(),
        "node flow assembled"
    );
    Ok(NodeFlow {
        node_mapping,
        edge_mapping,
        layer_offsets,
        flow_offsets,
        graph,
    })
}
