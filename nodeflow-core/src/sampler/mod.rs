//! Sampling an index from a discrete categorical distribution.
//!
//! Three interchangeable algorithms are provided behind the
//! [`CategoricalSampler`] capability and collected in the closed
//! [`WeightedSampler`] enum:
//!
//! | Kind | Build | Draw (with) | Draw (without) |
//! |------|-------|-------------|----------------|
//! | [`SamplerKind::Alias`] | O(n) | O(1) | amortised O(log n) |
//! | [`SamplerKind::Cdf`] | O(n) | O(log n) | amortised O(log n) |
//! | [`SamplerKind::Tree`] | O(n) | O(log n) | O(log n) |
//!
//! Weights need not sum to one. Zero-weight items are never drawn. In
//! without-replacement mode the alias and CDF variants keep a `used` mask and
//! rebuild their tables over the remaining items once half of the
//! accumulated mass has been taken; the tree variant zeroes the drawn leaf.

mod alias;
mod cdf;
mod tree;

use std::fmt;

use rand::{Rng, distributions::Standard};

use crate::error::SamplerError;

pub use self::{alias::AliasSampler, cdf::CdfSampler, tree::TreeSampler};

/// Whether an index may be drawn more than once.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Replacement {
    /// Draws are independent; an index may repeat.
    With,
    /// Each index is drawn at most once until the sampler is reset.
    #[default]
    Without,
}

/// Selects the algorithm backing a [`WeightedSampler`].
///
/// # Examples
/// ```
/// use nodeflow_core::SamplerKind;
///
/// assert_eq!(SamplerKind::default(), SamplerKind::Tree);
/// assert_eq!(SamplerKind::Alias.to_string(), "alias");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SamplerKind {
    /// Walker/Vose alias table.
    Alias,
    /// Prefix sums searched by bisection.
    Cdf,
    /// Complete binary tree of subtree sums.
    #[default]
    Tree,
}

impl SamplerKind {
    /// Every available algorithm.
    pub const ALL: [Self; 3] = [Self::Alias, Self::Cdf, Self::Tree];
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Alias => "alias",
            Self::Cdf => "cdf",
            Self::Tree => "tree",
        })
    }
}

/// Capability shared by every categorical sampling algorithm.
pub trait CategoricalSampler {
    /// Draws an index in `0..len()` with probability proportional to its weight.
    ///
    /// # Errors
    /// Returns [`SamplerError::DegenerateDistribution`] when no item carries
    /// weight, and [`SamplerError::PopulationExhausted`] in without-replacement
    /// mode once every positively weighted item has been drawn.
    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, SamplerError>;

    /// Discards all draw state and rebuilds over `weights`.
    ///
    /// # Errors
    /// Returns [`SamplerError::EmptyDistribution`] or
    /// [`SamplerError::InvalidWeight`] when `weights` is rejected.
    fn reset(&mut self, weights: &[f64]) -> Result<(), SamplerError>;

    /// Number of items in the distribution.
    fn len(&self) -> usize;

    /// Whether the distribution has no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Weighted sampler with a closed choice of algorithm.
///
/// # Examples
/// ```
/// use nodeflow_core::{CategoricalSampler, Replacement, SamplerKind, WeightedSampler};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let mut sampler = WeightedSampler::new(SamplerKind::Cdf, &[0.0, 3.0, 1.0], Replacement::Without)?;
/// let mut drawn = vec![sampler.draw(&mut rng)?, sampler.draw(&mut rng)?];
/// drawn.sort_unstable();
/// assert_eq!(drawn, [1, 2]);
/// assert!(sampler.draw(&mut rng).is_err());
/// # Ok::<(), nodeflow_core::SamplerError>(())
/// ```
#[derive(Clone, Debug)]
pub enum WeightedSampler {
    /// Alias-table backed sampler.
    Alias(AliasSampler),
    /// CDF backed sampler.
    Cdf(CdfSampler),
    /// Sum-tree backed sampler.
    Tree(TreeSampler),
}

impl WeightedSampler {
    /// Builds a sampler of the requested kind over `weights`.
    ///
    /// # Errors
    /// Returns [`SamplerError::EmptyDistribution`] for an empty slice and
    /// [`SamplerError::InvalidWeight`] for negative or non-finite weights, or
    /// when the weights overflow when summed.
    pub fn new(
        kind: SamplerKind,
        weights: &[f64],
        replacement: Replacement,
    ) -> Result<Self, SamplerError> {
        Ok(match kind {
            SamplerKind::Alias => Self::Alias(AliasSampler::new(weights, replacement)?),
            SamplerKind::Cdf => Self::Cdf(CdfSampler::new(weights, replacement)?),
            SamplerKind::Tree => Self::Tree(TreeSampler::new(weights, replacement)?),
        })
    }

    /// Returns the algorithm backing this sampler.
    #[must_use]
    pub const fn kind(&self) -> SamplerKind {
        match self {
            Self::Alias(_) => SamplerKind::Alias,
            Self::Cdf(_) => SamplerKind::Cdf,
            Self::Tree(_) => SamplerKind::Tree,
        }
    }
}

impl CategoricalSampler for WeightedSampler {
    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, SamplerError> {
        match self {
            Self::Alias(inner) => inner.draw(rng),
            Self::Cdf(inner) => inner.draw(rng),
            Self::Tree(inner) => inner.draw(rng),
        }
    }

    fn reset(&mut self, weights: &[f64]) -> Result<(), SamplerError> {
        match self {
            Self::Alias(inner) => inner.reset(weights),
            Self::Cdf(inner) => inner.reset(weights),
            Self::Tree(inner) => inner.reset(weights),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Alias(inner) => inner.len(),
            Self::Cdf(inner) => inner.len(),
            Self::Tree(inner) => inner.len(),
        }
    }
}

/// Uniform draw from `[0, 1)`.
pub(crate) fn unit_interval<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(Standard)
}

/// Rejects empty, negative, non-finite, and overflowing weight vectors.
pub(crate) fn validate_weights(weights: &[f64]) -> Result<(), SamplerError> {
    if weights.is_empty() {
        return Err(SamplerError::EmptyDistribution);
    }
    let mut total = 0.0_f64;
    for (index, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(SamplerError::InvalidWeight { index });
        }
        total += weight;
        if !total.is_finite() {
            return Err(SamplerError::InvalidWeight { index });
        }
    }
    Ok(())
}

/// Bookkeeping shared by the table-based samplers.
///
/// `live` maps compacted table positions back to original indices and lists
/// every item not yet drawn. `accumulated` is the weight of `live` when the
/// table was last built and `taken` the weight drawn since then, so
/// `taken <= accumulated` always holds.
#[derive(Clone, Debug)]
pub(crate) struct Population {
    weights: Vec<f64>,
    used: Vec<bool>,
    live: Vec<usize>,
    accumulated: f64,
    taken: f64,
    remaining: usize,
    drawn: usize,
    replacement: Replacement,
}

impl Population {
    pub(crate) fn new(weights: &[f64], replacement: Replacement) -> Result<Self, SamplerError> {
        validate_weights(weights)?;
        let mut population = Self {
            weights: weights.to_vec(),
            used: vec![false; weights.len()],
            live: Vec::with_capacity(weights.len()),
            accumulated: 0.0,
            taken: 0.0,
            remaining: weights.iter().filter(|&&w| w > 0.0).count(),
            drawn: 0,
            replacement,
        };
        population.collect_live();
        Ok(population)
    }

    /// Recomputes `live` and `accumulated` over unused items and clears `taken`.
    pub(crate) fn collect_live(&mut self) {
        self.live.clear();
        self.accumulated = 0.0;
        self.taken = 0.0;
        for (index, (&weight, &used)) in self.weights.iter().zip(&self.used).enumerate() {
            if !used {
                self.live.push(index);
                self.accumulated += weight;
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.weights.len()
    }

    pub(crate) fn replacement(&self) -> Replacement {
        self.replacement
    }

    pub(crate) fn live(&self) -> &[usize] {
        &self.live
    }

    pub(crate) fn weight(&self, index: usize) -> f64 {
        self.weights.get(index).copied().unwrap_or(0.0)
    }

    pub(crate) fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Whether enough mass has been taken that the table should be rebuilt.
    pub(crate) fn needs_rebuild(&self) -> bool {
        self.replacement == Replacement::Without && 2.0 * self.taken >= self.accumulated
    }

    pub(crate) fn ensure_available(&self) -> Result<(), SamplerError> {
        if self.remaining > 0 {
            return Ok(());
        }
        let population = self.weights.len();
        if self.drawn == 0 || self.replacement == Replacement::With {
            Err(SamplerError::DegenerateDistribution { population })
        } else {
            Err(SamplerError::PopulationExhausted { population })
        }
    }

    /// Whether `index` carries weight and may still be drawn.
    pub(crate) fn is_available(&self, index: usize) -> bool {
        self.weight(index) > 0.0
            && (self.replacement == Replacement::With
                || self.used.get(index).is_some_and(|used| !used))
    }

    /// Accepts `index` when it carries weight and is still available.
    pub(crate) fn accept(&mut self, index: usize) -> bool {
        let weight = self.weight(index);
        if weight <= 0.0 {
            return false;
        }
        if self.replacement == Replacement::With {
            self.drawn += 1;
            return true;
        }
        match self.used.get_mut(index) {
            Some(used) if !*used => {
                *used = true;
                self.taken += weight;
                self.remaining -= 1;
                self.drawn += 1;
                true
            }
            _ => false,
        }
    }
}
