//! Read-only adjacency abstractions consumed by the sampling engine.
//!
//! The engine never owns the graph. It only needs per-vertex slices of
//! neighbour ids and their parallel edge ids, bounded by a CSR row pointer,
//! plus a multigraph flag. [`CsrGraph`] is a ready-made implementation built
//! from an edge list.

use std::{collections::HashSet, fmt};

use crate::error::GraphError;

/// Which incident edges a traversal follows.
///
/// # Examples
/// ```
/// use nodeflow_core::EdgeDirection;
///
/// assert_eq!(EdgeDirection::In.to_string(), "in");
/// assert_eq!(EdgeDirection::Out.reversed(), EdgeDirection::In);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum EdgeDirection {
    /// Follow in-edges: the neighbours of `v` are the sources of edges `u -> v`.
    #[default]
    In,
    /// Follow out-edges: the neighbours of `v` are the targets of edges `v -> u`.
    Out,
}

impl EdgeDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }
}

impl fmt::Display for EdgeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "in",
            Self::Out => "out",
        })
    }
}

/// Borrowed adjacency row: neighbour ids and the ids of the edges reaching them.
///
/// Both slices always have the same length.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AdjacencySlice<'a> {
    neighbours: &'a [usize],
    edges: &'a [usize],
}

impl<'a> AdjacencySlice<'a> {
    /// Pairs neighbour ids with their edge ids.
    ///
    /// # Errors
    /// Returns [`GraphError::MalformedCsr`] when the slices differ in length.
    pub fn new(neighbours: &'a [usize], edges: &'a [usize]) -> Result<Self, GraphError> {
        if neighbours.len() != edges.len() {
            return Err(GraphError::MalformedCsr {
                reason: format!(
                    "adjacency row has {} neighbours but {} edge ids",
                    neighbours.len(),
                    edges.len()
                ),
            });
        }
        Ok(Self { neighbours, edges })
    }

    /// Returns an empty row.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            neighbours: &[],
            edges: &[],
        }
    }

    /// Neighbour vertex ids.
    #[must_use]
    #[rustfmt::skip]
    pub fn neighbours(&self) -> &'a [usize] { self.neighbours }

    /// Edge ids parallel to [`Self::neighbours`].
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &'a [usize] { self.edges }

    /// Number of entries in the row.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.neighbours.len() }

    /// Whether the row has no entries.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.neighbours.is_empty() }
}

/// Read-only view over a directed graph stored in compressed rows.
///
/// # Examples
/// ```
/// use nodeflow_core::{CsrGraph, EdgeDirection, GraphView};
///
/// let graph = CsrGraph::from_edges(3, &[(0, 1), (0, 2), (1, 2)])?;
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.adjacency(0, EdgeDirection::Out)?.neighbours(), &[1, 2]);
/// assert_eq!(graph.adjacency(2, EdgeDirection::In)?.neighbours(), &[0, 1]);
/// assert_eq!(graph.successors(1)?, &[2]);
/// # Ok::<(), nodeflow_core::GraphError>(())
/// ```
pub trait GraphView {
    /// Returns the number of vertices.
    fn node_count(&self) -> usize;

    /// Returns whether the vertex exists.
    fn has_node(&self, node: usize) -> bool {
        node < self.node_count()
    }

    /// Returns whether parallel edges between the same pair of vertices exist.
    fn is_multigraph(&self) -> bool;

    /// Returns the adjacency row of `node` in the requested direction.
    ///
    /// # Errors
    /// Implementations must return [`GraphError::NodeOutOfBounds`] for
    /// vertices that do not exist.
    fn adjacency(
        &self,
        node: usize,
        direction: EdgeDirection,
    ) -> Result<AdjacencySlice<'_>, GraphError>;

    /// Returns the successors of `node` (targets of its out-edges).
    ///
    /// # Errors
    /// Returns any [`GraphError`] surfaced by [`Self::adjacency`].
    fn successors(&self, node: usize) -> Result<&[usize], GraphError> {
        Ok(self.adjacency(node, EdgeDirection::Out)?.neighbours())
    }
}

/// Compressed sparse row arrays: `indptr`, column `indices`, and `edge_ids`.
///
/// # Examples
/// ```
/// use nodeflow_core::Csr;
///
/// let csr = Csr::from_parts(vec![0, 2, 2, 3], vec![1, 2, 0], vec![0, 1, 2])?;
/// assert_eq!(csr.row_count(), 3);
/// assert_eq!(csr.row(0)?.neighbours(), &[1, 2]);
/// assert_eq!(csr.degree_sum(0, 2), 2);
/// # Ok::<(), nodeflow_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Csr {
    indptr: Vec<usize>,
    indices: Vec<usize>,
    edge_ids: Vec<usize>,
}

impl Csr {
    /// Validates and wraps raw CSR arrays.
    ///
    /// # Errors
    /// Returns [`GraphError::MalformedCsr`] when `indptr` is empty, does not
    /// start at zero, decreases, or does not end at `indices.len()`, or when
    /// `indices` and `edge_ids` differ in length.
    pub fn from_parts(
        indptr: Vec<usize>,
        indices: Vec<usize>,
        edge_ids: Vec<usize>,
    ) -> Result<Self, GraphError> {
        let malformed = |reason: String| GraphError::MalformedCsr { reason };
        if indptr.first() != Some(&0) {
            return Err(malformed("indptr must start at zero".into()));
        }
        if indptr.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(malformed("indptr must be non-decreasing".into()));
        }
        if indptr.last() != Some(&indices.len()) {
            return Err(malformed(format!(
                "indptr ends at {:?} but there are {} column indices",
                indptr.last(),
                indices.len()
            )));
        }
        if indices.len() != edge_ids.len() {
            return Err(malformed(format!(
                "{} column indices but {} edge ids",
                indices.len(),
                edge_ids.len()
            )));
        }
        Ok(Self {
            indptr,
            indices,
            edge_ids,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.indptr.len().saturating_sub(1)
    }

    /// Number of stored entries.
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_count(&self) -> usize { self.indices.len() }

    /// Row pointer array of length `row_count() + 1`.
    #[must_use]
    #[rustfmt::skip]
    pub fn indptr(&self) -> &[usize] { &self.indptr }

    /// Column indices.
    #[must_use]
    #[rustfmt::skip]
    pub fn indices(&self) -> &[usize] { &self.indices }

    /// Edge ids parallel to [`Self::indices`].
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_ids(&self) -> &[usize] { &self.edge_ids }

    /// Returns the entries stored for `row`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] when `row` does not exist.
    pub fn row(&self, row: usize) -> Result<AdjacencySlice<'_>, GraphError> {
        let out_of_bounds = || GraphError::NodeOutOfBounds {
            node: row,
            node_count: self.row_count(),
        };
        let start = *self.indptr.get(row).ok_or_else(out_of_bounds)?;
        let end = *self
            .indptr
            .get(row.saturating_add(1))
            .ok_or_else(out_of_bounds)?;
        AdjacencySlice::new(&self.indices[start..end], &self.edge_ids[start..end])
    }

    /// Number of entries in `row`, or zero for rows that do not exist.
    #[must_use]
    pub fn degree(&self, row: usize) -> usize {
        self.degree_sum(row, row.saturating_add(1))
    }

    /// Total number of entries in rows `start..end`, clamped to existing rows.
    #[must_use]
    pub fn degree_sum(&self, start: usize, end: usize) -> usize {
        let last = self.row_count();
        let end = end.min(last);
        let start = start.min(end);
        self.indptr[end] - self.indptr[start]
    }

    /// Swaps rows and columns of a square layout, keeping edge ids.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`] when a column index is not a
    /// valid row.
    pub fn transpose(&self) -> Result<Self, GraphError> {
        let row_count = self.row_count();
        if let Some(&node) = self.indices.iter().find(|&&column| column >= row_count) {
            return Err(GraphError::NodeOutOfBounds {
                node,
                node_count: row_count,
            });
        }
        let entries = (0..row_count).flat_map(|row| {
            let range = self.indptr[row]..self.indptr[row + 1];
            self.indices[range.clone()]
                .iter()
                .zip(&self.edge_ids[range])
                .map(move |(&column, &edge_id)| (column, row, edge_id))
        });
        Ok(bucket_entries(row_count, entries))
    }
}

/// Directed graph holding both in- and out-CSR, built from an edge list.
///
/// Edge ids are the positions of the edges in the input list.
///
/// # Examples
/// ```
/// use nodeflow_core::{CsrGraph, EdgeDirection, GraphView};
///
/// let graph = CsrGraph::from_edges(2, &[(0, 1), (0, 1)])?;
/// assert!(graph.is_multigraph());
/// assert_eq!(graph.adjacency(0, EdgeDirection::Out)?.edges(), &[0, 1]);
/// # Ok::<(), nodeflow_core::GraphError>(())
/// ```
#[derive(Clone, Debug)]
pub struct CsrGraph {
    out_csr: Csr,
    in_csr: Csr,
    multigraph: bool,
}

impl CsrGraph {
    /// Builds a graph with `node_count` vertices from `(source, target)` pairs.
    ///
    /// # Errors
    /// Returns [`GraphError::EdgeOutOfBounds`] when an endpoint is not below
    /// `node_count`.
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Result<Self, GraphError> {
        if let Some(index) = edges
            .iter()
            .position(|&(src, dst)| src >= node_count || dst >= node_count)
        {
            return Err(GraphError::EdgeOutOfBounds { index, node_count });
        }
        let out_csr = bucket_entries(
            node_count,
            edges.iter().enumerate().map(|(id, &(src, dst))| (src, dst, id)),
        );
        let in_csr = bucket_entries(
            node_count,
            edges.iter().enumerate().map(|(id, &(src, dst))| (dst, src, id)),
        );
        let mut seen = HashSet::with_capacity(edges.len());
        let multigraph = !edges.iter().all(|edge| seen.insert(*edge));
        Ok(Self {
            out_csr,
            in_csr,
            multigraph,
        })
    }

    /// Returns the CSR used for the given direction.
    #[must_use]
    pub fn csr(&self, direction: EdgeDirection) -> &Csr {
        match direction {
            EdgeDirection::In => &self.in_csr,
            EdgeDirection::Out => &self.out_csr,
        }
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.out_csr.edge_count()
    }
}

/// Counting sort of `(row, column, edge_id)` triples into CSR; entries of a
/// row keep their input order.
fn bucket_entries(
    row_count: usize,
    entries: impl Iterator<Item = (usize, usize, usize)> + Clone,
) -> Csr {
    let mut indptr = vec![0_usize; row_count + 1];
    for (row, _, _) in entries.clone() {
        indptr[row + 1] += 1;
    }
    for row in 0..row_count {
        indptr[row + 1] += indptr[row];
    }
    let total = indptr[row_count];
    let mut cursor = indptr.clone();
    let mut indices = vec![0_usize; total];
    let mut edge_ids = vec![0_usize; total];
    for (row, column, edge_id) in entries {
        let slot = cursor[row];
        indices[slot] = column;
        edge_ids[slot] = edge_id;
        cursor[row] += 1;
    }
    Csr {
        indptr,
        indices,
        edge_ids,
    }
}

impl GraphView for CsrGraph {
    fn node_count(&self) -> usize {
        self.out_csr.row_count()
    }

    fn is_multigraph(&self) -> bool {
        self.multigraph
    }

    fn adjacency(
        &self,
        node: usize,
        direction: EdgeDirection,
    ) -> Result<AdjacencySlice<'_>, GraphError> {
        self.csr(direction).row(node)
    }
}
