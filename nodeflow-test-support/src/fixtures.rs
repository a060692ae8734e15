//! Small directed graphs shared by unit, integration, and bench suites.
//!
//! Graphs are plain `(source, target)` edge lists so this crate stays
//! independent of the graph types under test. Edge ids are list positions.

/// Vertex count of [`DIAMOND_EDGES`].
pub const DIAMOND_NODES: usize = 5;

/// `0 -> {1, 2} -> 3 -> 4`.
pub const DIAMOND_EDGES: [(usize, usize); 5] = [(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)];

/// Directed path `0 -> 1 -> ... -> len - 1`.
///
/// # Examples
/// ```
/// use nodeflow_test_support::fixtures::path_edges;
///
/// assert_eq!(path_edges(3), vec![(0, 1), (1, 2)]);
/// assert!(path_edges(1).is_empty());
/// ```
#[must_use]
pub fn path_edges(len: usize) -> Vec<(usize, usize)> {
    (1..len).map(|v| (v - 1, v)).collect()
}

/// Star whose `leaves` vertices `1..=leaves` all point at vertex 0.
#[must_use]
pub fn in_star_edges(leaves: usize) -> Vec<(usize, usize)> {
    (1..=leaves).map(|leaf| (leaf, 0)).collect()
}

/// Ring over `len` vertices with an extra chord from each vertex to
/// `v + chord`.
#[must_use]
pub fn chorded_ring_edges(len: usize, chord: usize) -> Vec<(usize, usize)> {
    (0..len)
        .flat_map(|v| [(v, (v + 1) % len), (v, (v + chord) % len)])
        .collect()
}
