use nodeflow_core::{AdjacencySlice, EdgeDirection, GraphError, GraphView};

/// Adjacency-list graph exercising [`GraphView`] outside the bundled CSR.
#[derive(Clone, Debug)]
pub struct AdjacencyLists {
    out_neighbours: Vec<Vec<usize>>,
    out_edges: Vec<Vec<usize>>,
    in_neighbours: Vec<Vec<usize>>,
    in_edges: Vec<Vec<usize>>,
}

impl AdjacencyLists {
    #[must_use]
    pub fn new(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = Self {
            out_neighbours: vec![Vec::new(); node_count],
            out_edges: vec![Vec::new(); node_count],
            in_neighbours: vec![Vec::new(); node_count],
            in_edges: vec![Vec::new(); node_count],
        };
        for (id, &(src, dst)) in edges.iter().enumerate() {
            graph.out_neighbours[src].push(dst);
            graph.out_edges[src].push(id);
            graph.in_neighbours[dst].push(src);
            graph.in_edges[dst].push(id);
        }
        graph
    }
}

impl GraphView for AdjacencyLists {
    fn node_count(&self) -> usize {
        self.out_neighbours.len()
    }

    fn is_multigraph(&self) -> bool {
        false
    }

    fn adjacency(
        &self,
        node: usize,
        direction: EdgeDirection,
    ) -> Result<AdjacencySlice<'_>, GraphError> {
        let (neighbours, edges) = match direction {
            EdgeDirection::Out => (&self.out_neighbours, &self.out_edges),
            EdgeDirection::In => (&self.in_neighbours, &self.in_edges),
        };
        match (neighbours.get(node), edges.get(node)) {
            (Some(neighbours), Some(edges)) => AdjacencySlice::new(neighbours, edges),
            _ => Err(GraphError::NodeOutOfBounds {
                node,
                node_count: self.node_count(),
            }),
        }
    }
}
