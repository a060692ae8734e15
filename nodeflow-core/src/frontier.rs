//! Multi-hop frontier expansion from a set of seed vertices.
//!
//! Expansion proceeds hop by hop. Every vertex of the previous layer has its
//! adjacency row sub-sampled by a [`NeighbourPicker`]; the retained pairs are
//! appended to a shared [`NeighbourArena`] and addressed through an
//! [`ArenaSpan`] recorded per vertex. Vertices are deduplicated within a
//! layer only, so one vertex may appear in several layers.

use std::{collections::HashSet, ops::Range};

use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::{
    error::Result,
    graph::{AdjacencySlice, EdgeDirection, GraphView},
    picker::{NeighbourPicker, PickedNeighbours},
};

/// A vertex discovered at a given hop.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FrontierEntry {
    /// Global vertex id.
    pub node: usize,
    /// Hop at which the vertex was discovered; seeds are layer `0`.
    pub layer: usize,
}

/// Ordered frontier with per-layer boundaries.
///
/// Layer `i` occupies `entries[layer_offsets[i]..layer_offsets[i + 1]]` and
/// `layer_offsets[0] == 0`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Frontier {
    entries: Vec<FrontierEntry>,
    layer_offsets: Vec<usize>,
}

impl Frontier {
    /// All entries in discovery order.
    #[rustfmt::skip]
    #[must_use]
    pub fn entries(&self) -> &[FrontierEntry] { &self.entries }

    /// Layer boundaries; one longer than [`Self::layer_count`].
    #[rustfmt::skip]
    #[must_use]
    pub fn layer_offsets(&self) -> &[usize] { &self.layer_offsets }

    /// Number of layers, seeds included.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layer_offsets.len().saturating_sub(1)
    }

    /// Number of entries across all layers.
    #[rustfmt::skip]
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the frontier holds no entries.
    #[rustfmt::skip]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Index range of `layer` within [`Self::entries`].
    #[must_use]
    pub fn layer_range(&self, layer: usize) -> Option<Range<usize>> {
        let start = *self.layer_offsets.get(layer)?;
        let end = *self.layer_offsets.get(layer + 1)?;
        Some(start..end)
    }

    /// Entries of `layer`.
    #[must_use]
    pub fn layer(&self, layer: usize) -> Option<&[FrontierEntry]> {
        self.layer_range(layer).map(|range| &self.entries[range])
    }
}

/// Half-open `(offset, len)` window into a [`NeighbourArena`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ArenaSpan {
    offset: usize,
    len: usize,
}

impl ArenaSpan {
    /// First arena position covered.
    #[rustfmt::skip]
    #[must_use]
    pub fn offset(&self) -> usize { self.offset }

    /// Number of pairs in the span.
    #[rustfmt::skip]
    #[must_use]
    pub fn len(&self) -> usize { self.len }

    /// Whether the span covers no pairs.
    #[rustfmt::skip]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Position range covered by the span.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Append-only parallel neighbour and edge lists shared by one expansion.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NeighbourArena {
    neighbours: Vec<usize>,
    edges: Vec<usize>,
}

impl NeighbourArena {
    /// Appends a picked row and returns the span it occupies.
    pub fn push(&mut self, picked: PickedNeighbours) -> ArenaSpan {
        let offset = self.neighbours.len();
        let (neighbours, edges) = picked.into_parts();
        self.neighbours.extend(neighbours);
        self.edges.extend(edges);
        ArenaSpan {
            offset,
            len: self.neighbours.len() - offset,
        }
    }

    /// Returns the pairs covered by `span`, or `None` if it lies outside the
    /// arena.
    #[must_use]
    pub fn slice(&self, span: ArenaSpan) -> Option<AdjacencySlice<'_>> {
        let range = span.range();
        let neighbours = self.neighbours.get(range.clone())?;
        let edges = self.edges.get(range)?;
        AdjacencySlice::new(neighbours, edges).ok()
    }

    /// Total number of sampled edges.
    #[rustfmt::skip]
    #[must_use]
    pub fn len(&self) -> usize { self.neighbours.len() }

    /// Whether nothing has been sampled yet.
    #[rustfmt::skip]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.neighbours.is_empty() }

    /// Global neighbour ids of every row, concatenated.
    #[rustfmt::skip]
    #[must_use]
    pub fn neighbours(&self) -> &[usize] { &self.neighbours }

    /// Global edge ids aligned with [`Self::neighbours`].
    #[rustfmt::skip]
    #[must_use]
    pub fn edges(&self) -> &[usize] { &self.edges }
}

/// Where the sampled neighbours of one frontier vertex live in the arena.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NeighbourRecord {
    /// Global id of the expanded vertex.
    pub node: usize,
    /// Window holding its sampled neighbours and edges.
    pub span: ArenaSpan,
}

/// Output of [`FrontierExpander::expand`].
///
/// `records[i]` describes `frontier.entries()[i]` for every entry outside
/// the last layer; vertices of the last layer are never expanded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Expansion {
    frontier: Frontier,
    arena: NeighbourArena,
    records: Vec<NeighbourRecord>,
}

impl Expansion {
    /// Layered vertices reached by the expansion.
    #[rustfmt::skip]
    #[must_use]
    pub fn frontier(&self) -> &Frontier { &self.frontier }

    /// Storage for every sampled row.
    #[rustfmt::skip]
    #[must_use]
    pub fn arena(&self) -> &NeighbourArena { &self.arena }

    /// One record per expanded frontier entry.
    #[rustfmt::skip]
    #[must_use]
    pub fn records(&self) -> &[NeighbourRecord] { &self.records }

    /// Total number of sampled edges.
    #[rustfmt::skip]
    #[must_use]
    pub fn edge_count(&self) -> usize { self.arena.len() }
}

#[cfg(test)]
impl Expansion {
    /// Builds an expansion from raw parts. `rows` lists
    /// `(node, neighbours, edges)` for each expanded entry in order.
    pub(crate) fn from_raw(
        entries: Vec<FrontierEntry>,
        layer_offsets: Vec<usize>,
        rows: Vec<(usize, Vec<usize>, Vec<usize>)>,
    ) -> Self {
        let mut arena = NeighbourArena::default();
        let records = rows
            .into_iter()
            .map(|(node, neighbours, edges)| {
                let offset = arena.neighbours.len();
                arena.neighbours.extend(neighbours);
                arena.edges.extend(edges);
                NeighbourRecord {
                    node,
                    span: ArenaSpan {
                        offset,
                        len: arena.neighbours.len() - offset,
                    },
                }
            })
            .collect();
        Self {
            frontier: Frontier {
                entries,
                layer_offsets,
            },
            arena,
            records,
        }
    }
}

/// Expands a frontier over `hops` hops, sampling at most `max_count`
/// neighbours per visited vertex.
///
/// # Examples
/// ```
/// use nodeflow_core::{CsrGraph, EdgeDirection, FrontierExpander, NeighbourPicker};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let graph = CsrGraph::from_edges(4, &[(0, 1), (0, 2), (1, 3), (2, 3)])?;
/// let mut expander = FrontierExpander::new(2, EdgeDirection::Out, NeighbourPicker::new(8)?);
/// let expansion = expander.expand(&graph, &[0], None, &mut SmallRng::seed_from_u64(3))?;
/// assert_eq!(expansion.frontier().layer_offsets(), &[0, 1, 3, 4]);
/// assert_eq!(expansion.edge_count(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct FrontierExpander {
    hops: usize,
    direction: EdgeDirection,
    picker: NeighbourPicker,
}

impl FrontierExpander {
    /// Creates an expander that follows `direction` for `hops` hops.
    #[must_use]
    pub fn new(hops: usize, direction: EdgeDirection, picker: NeighbourPicker) -> Self {
        Self {
            hops,
            direction,
            picker,
        }
    }

    /// Number of hops expanded.
    #[rustfmt::skip]
    #[must_use]
    pub fn hops(&self) -> usize { self.hops }

    /// Edge direction followed.
    #[rustfmt::skip]
    #[must_use]
    pub fn direction(&self) -> EdgeDirection { self.direction }

    /// Expands from `seeds`, producing `hops + 1` layers.
    ///
    /// Duplicate seeds collapse into one layer-0 entry. When `probability` is
    /// supplied each row is sampled by weight, looking weights up by
    /// neighbour id; otherwise rows are sampled uniformly.
    ///
    /// # Errors
    /// Returns [`crate::SamplingError::Graph`] when a visited vertex has no
    /// adjacency row, and propagates picker failures with the hop and vertex
    /// attached.
    #[instrument(
        name = "core.expand",
        err,
        skip(self, graph, seeds, probability, rng),
        fields(
            seeds = seeds.len(),
            hops = self.hops,
            direction = %self.direction,
            weighted = probability.is_some()
        ),
    )]
    pub fn expand<G, R>(
        &mut self,
        graph: &G,
        seeds: &[usize],
        probability: Option<&[f64]>,
        rng: &mut R,
    ) -> Result<Expansion>
    where
        G: GraphView + ?Sized,
        R: Rng + ?Sized,
    {
        let mut entries = Vec::with_capacity(seeds.len());
        let mut seen = HashSet::with_capacity(seeds.len());
        for &seed in seeds {
            if seen.insert(seed) {
                entries.push(FrontierEntry {
                    node: seed,
                    layer: 0,
                });
            }
        }
        if entries.len() < seeds.len() {
            warn!(
                supplied = seeds.len(),
                distinct = entries.len(),
                "duplicate seeds collapsed"
            );
        }

        let mut layer_offsets = Vec::with_capacity(self.hops + 2);
        layer_offsets.extend([0, entries.len()]);
        let mut arena = NeighbourArena::default();
        let mut records = Vec::new();

        for hop in 0..self.hops {
            seen.clear();
            let (start, end) = (layer_offsets[hop], layer_offsets[hop + 1]);
            for index in start..end {
                let node = entries[index].node;
                let adjacency = graph.adjacency(node, self.direction)?;
                let picked = match probability {
                    Some(probability) => self.picker.pick_weighted(adjacency, probability, rng),
                    None => self.picker.pick(adjacency, rng),
                }
                .map_err(|err| err.at(hop, node))?;
                for &neighbour in picked.neighbours() {
                    if seen.insert(neighbour) {
                        entries.push(FrontierEntry {
                            node: neighbour,
                            layer: hop + 1,
                        });
                    }
                }
                let span = arena.push(picked);
                records.push(NeighbourRecord { node, span });
            }
            layer_offsets.push(entries.len());
            debug!(
                layer = hop + 1,
                layer_size = entries.len() - end,
                edges = arena.len(),
                "hop expanded"
            );
        }

        Ok(Expansion {
            frontier: Frontier {
                entries,
                layer_offsets,
            },
            arena,
            records,
        })
    }
}
