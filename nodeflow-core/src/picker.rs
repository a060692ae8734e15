//! Bounded neighbour sub-sampling for a single vertex.
//!
//! [`NeighbourPicker`] takes one adjacency row and returns at most
//! `max_count` `(neighbour, edge)` pairs from it. Rows that already fit are
//! returned untouched. Larger rows are sampled uniformly (distinct positions
//! in ascending order) or, when a per-vertex probability table is supplied,
//! by a without-replacement [`WeightedSampler`].

use std::collections::HashSet;

use rand::Rng;

use crate::{
    error::{GraphError, Result, SamplerError, SamplingError, Stage},
    graph::AdjacencySlice,
    sampler::{CategoricalSampler, Replacement, SamplerKind, WeightedSampler},
};

/// How the weighted pick orders its output.
///
/// # Examples
/// ```
/// use nodeflow_core::PairOrdering;
///
/// assert_eq!(PairOrdering::default(), PairOrdering::Paired);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum PairOrdering {
    /// Sort `(neighbour, edge)` pairs by neighbour id, keeping each edge next
    /// to the neighbour it reaches.
    #[default]
    Paired,
    /// Sort neighbour ids and edge ids as two separate sequences. The
    /// `i`-th edge no longer necessarily reaches the `i`-th neighbour.
    Independent,
}

/// Neighbours retained for one vertex together with their edge ids.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PickedNeighbours {
    neighbours: Vec<usize>,
    edges: Vec<usize>,
}

impl PickedNeighbours {
    fn whole(adjacency: AdjacencySlice<'_>) -> Self {
        Self {
            neighbours: adjacency.neighbours().to_vec(),
            edges: adjacency.edges().to_vec(),
        }
    }

    fn at_positions(adjacency: AdjacencySlice<'_>, positions: &[usize]) -> Self {
        let neighbours = adjacency.neighbours();
        let edges = adjacency.edges();
        Self {
            neighbours: positions.iter().map(|&pos| neighbours[pos]).collect(),
            edges: positions.iter().map(|&pos| edges[pos]).collect(),
        }
    }

    /// Retained neighbour ids.
    #[rustfmt::skip]
    #[must_use]
    pub fn neighbours(&self) -> &[usize] { &self.neighbours }

    /// Edge ids parallel to [`Self::neighbours`].
    #[rustfmt::skip]
    #[must_use]
    pub fn edges(&self) -> &[usize] { &self.edges }

    /// Number of retained neighbours.
    #[rustfmt::skip]
    #[must_use]
    pub fn len(&self) -> usize { self.neighbours.len() }

    /// Whether nothing was retained.
    #[rustfmt::skip]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.neighbours.is_empty() }

    /// Splits into `(neighbours, edges)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<usize>, Vec<usize>) {
        (self.neighbours, self.edges)
    }
}

/// Picks at most `max_count` neighbours from an adjacency row.
///
/// The picker keeps scratch buffers and its weighted sampler between calls,
/// so one instance should be reused across the vertices of an expansion.
///
/// # Examples
/// ```
/// use nodeflow_core::{AdjacencySlice, NeighbourPicker};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let neighbours = [10, 11, 12, 13, 14, 15];
/// let edges = [0, 1, 2, 3, 4, 5];
/// let row = AdjacencySlice::new(&neighbours, &edges)?;
/// let mut picker = NeighbourPicker::new(2)?;
/// let picked = picker.pick(row, &mut SmallRng::seed_from_u64(1))?;
/// assert_eq!(picked.len(), 2);
/// assert!(picked.neighbours()[0] < picked.neighbours()[1]);
/// # Ok::<(), nodeflow_core::SamplingError>(())
/// ```
#[derive(Clone, Debug)]
pub struct NeighbourPicker {
    max_count: usize,
    sampler_kind: SamplerKind,
    ordering: PairOrdering,
    drawn: HashSet<usize>,
    weights: Vec<f64>,
    sampler: Option<WeightedSampler>,
}

impl NeighbourPicker {
    /// Creates a picker retaining at most `max_count` neighbours per row.
    ///
    /// # Errors
    /// Returns [`SamplingError::InvalidParameters`] when `max_count` is zero.
    pub fn new(max_count: usize) -> Result<Self> {
        if max_count == 0 {
            return Err(SamplingError::InvalidParameters {
                reason: "max_neighbours must be greater than zero".into(),
            });
        }
        Ok(Self {
            max_count,
            sampler_kind: SamplerKind::default(),
            ordering: PairOrdering::default(),
            drawn: HashSet::with_capacity(max_count),
            weights: Vec::new(),
            sampler: None,
        })
    }

    /// Selects the algorithm used for weighted picks.
    #[must_use]
    pub fn with_sampler_kind(mut self, kind: SamplerKind) -> Self {
        self.sampler_kind = kind;
        self
    }

    /// Selects how weighted picks are ordered.
    #[must_use]
    pub fn with_pair_ordering(mut self, ordering: PairOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Maximum number of neighbours retained per row.
    #[rustfmt::skip]
    #[must_use]
    pub fn max_count(&self) -> usize { self.max_count }

    /// Picks neighbours uniformly without replacement.
    ///
    /// Rows no longer than `max_count` are returned unchanged. Otherwise
    /// exactly `max_count` distinct positions are drawn and the pairs at those
    /// positions are returned in ascending position order.
    ///
    /// # Errors
    /// Returns [`SamplingError::InvariantViolation`] if the drawn positions
    /// are not strictly increasing or have the wrong length.
    pub fn pick<R: Rng + ?Sized>(
        &mut self,
        adjacency: AdjacencySlice<'_>,
        rng: &mut R,
    ) -> Result<PickedNeighbours> {
        let count = adjacency.len();
        if count <= self.max_count {
            return Ok(PickedNeighbours::whole(adjacency));
        }
        let positions = self.uniform_positions(count, rng)?;
        Ok(PickedNeighbours::at_positions(adjacency, &positions))
    }

    /// Picks neighbours by weight without replacement.
    ///
    /// The weight of a neighbour is `probability[neighbour]`. Zero-weight
    /// neighbours are never retained, so fewer than `max_count` pairs come
    /// back when fewer carry weight.
    ///
    /// # Errors
    /// Returns [`SamplingError::Graph`] when a neighbour id is outside
    /// `probability`, and [`SamplingError::Sampler`] when the weights are
    /// negative or non-finite.
    pub fn pick_weighted<R: Rng + ?Sized>(
        &mut self,
        adjacency: AdjacencySlice<'_>,
        probability: &[f64],
        rng: &mut R,
    ) -> Result<PickedNeighbours> {
        let count = adjacency.len();
        if count <= self.max_count {
            return Ok(PickedNeighbours::whole(adjacency));
        }

        self.weights.clear();
        for &neighbour in adjacency.neighbours() {
            let weight = probability
                .get(neighbour)
                .copied()
                .ok_or(GraphError::NodeOutOfBounds {
                    node: neighbour,
                    node_count: probability.len(),
                })?;
            self.weights.push(weight);
        }
        let sampler = match &mut self.sampler {
            Some(sampler) if sampler.kind() == self.sampler_kind => {
                sampler.reset(&self.weights)?;
                sampler
            }
            slot => slot.insert(WeightedSampler::new(
                self.sampler_kind,
                &self.weights,
                Replacement::Without,
            )?),
        };

        let mut positions = Vec::with_capacity(self.max_count);
        while positions.len() < self.max_count {
            match sampler.draw(rng) {
                Ok(position) => positions.push(position),
                Err(
                    SamplerError::PopulationExhausted { .. }
                    | SamplerError::DegenerateDistribution { .. },
                ) => break,
                Err(err) => return Err(err.into()),
            }
        }

        let mut picked = PickedNeighbours::at_positions(adjacency, &positions);
        match self.ordering {
            PairOrdering::Paired => {
                let mut pairs: Vec<_> = picked
                    .neighbours
                    .iter()
                    .copied()
                    .zip(picked.edges.iter().copied())
                    .collect();
                pairs.sort_unstable();
                let (neighbours, edges) = pairs.into_iter().unzip();
                picked = PickedNeighbours { neighbours, edges };
            }
            PairOrdering::Independent => {
                picked.neighbours.sort_unstable();
                picked.edges.sort_unstable();
            }
        }
        Ok(picked)
    }

    /// Draws `max_count` distinct ascending positions from `0..count`.
    ///
    /// Sparse picks (`count > 2 * max_count`) draw the kept positions
    /// directly. Dense picks draw the `count - max_count` excluded positions
    /// and emit the sorted complement.
    fn uniform_positions<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        let max = self.max_count;
        let mut positions = Vec::with_capacity(max);
        if count > 2 * max {
            draw_distinct(&mut self.drawn, count, max, rng);
            positions.extend(self.drawn.drain());
            positions.sort_unstable();
        } else {
            draw_distinct(&mut self.drawn, count, count - max, rng);
            let mut excluded: Vec<_> = self.drawn.drain().collect();
            excluded.sort_unstable();
            let mut skip = excluded.into_iter().peekable();
            for position in 0..count {
                if skip.next_if_eq(&position).is_none() {
                    positions.push(position);
                }
            }
        }

        let ascending = positions.windows(2).all(|pair| pair[0] < pair[1]);
        debug_assert!(ascending, "picked positions must be strictly increasing");
        debug_assert_eq!(positions.len(), max, "picked position count");
        if !ascending || positions.len() != max {
            return Err(SamplingError::invariant(
                Stage::Pick,
                0,
                None,
                format!(
                    "expected {max} strictly increasing positions out of {count}, got {}",
                    positions.len()
                ),
            ));
        }
        Ok(positions)
    }
}

/// Fills `drawn` with `target` distinct values from `0..count`.
fn draw_distinct<R: Rng + ?Sized>(
    drawn: &mut HashSet<usize>,
    count: usize,
    target: usize,
    rng: &mut R,
) {
    drawn.clear();
    while drawn.len() < target {
        drawn.insert(rng.gen_range(0..count));
    }
}
