//! Sum-tree (array heap) sampler.

use rand::Rng;

use crate::error::SamplerError;

use super::{CategoricalSampler, Replacement, unit_interval, validate_weights};

/// Samples by descending a complete binary tree of subtree sums.
///
/// Node `1` is the root and node `i` has children `2i` and `2i + 1`. Leaves
/// start at `leaf_base`, the smallest power of two not below the item count.
/// Without replacement a drawn leaf is zeroed and its ancestors recomputed, so
/// no separate `used` mask is kept.
#[derive(Clone, Debug)]
pub struct TreeSampler {
    sums: Vec<f64>,
    leaf_base: usize,
    len: usize,
    drawn: usize,
    replacement: Replacement,
}

impl TreeSampler {
    /// Builds the sum tree over `weights`.
    ///
    /// # Errors
    /// Returns [`SamplerError::EmptyDistribution`] or
    /// [`SamplerError::InvalidWeight`] when `weights` is rejected.
    pub fn new(weights: &[f64], replacement: Replacement) -> Result<Self, SamplerError> {
        let mut sampler = Self {
            sums: Vec::new(),
            leaf_base: 1,
            len: 0,
            drawn: 0,
            replacement,
        };
        sampler.reset(weights)?;
        Ok(sampler)
    }

    fn descend(&self, target: f64) -> usize {
        let mut node = 1;
        let mut offset = 0.0;
        while node < self.leaf_base {
            let left = self.sums[2 * node];
            let right = self.sums[2 * node + 1];
            let pivot = offset + left;
            // Never enter an empty subtree, even when rounding puts `target`
            // on the wrong side of the pivot.
            if left <= 0.0 || (target >= pivot && right > 0.0) {
                node = 2 * node + 1;
                offset = pivot;
            } else {
                node *= 2;
            }
        }
        node
    }

    fn clear_leaf(&mut self, leaf: usize) {
        self.sums[leaf] = 0.0;
        let mut node = leaf / 2;
        while node >= 1 {
            self.sums[node] = self.sums[2 * node] + self.sums[2 * node + 1];
            node /= 2;
        }
    }
}

impl CategoricalSampler for TreeSampler {
    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, SamplerError> {
        let total = self.sums[1];
        if total <= 0.0 {
            return Err(if self.drawn == 0 || self.replacement == Replacement::With {
                SamplerError::DegenerateDistribution {
                    population: self.len,
                }
            } else {
                SamplerError::PopulationExhausted {
                    population: self.len,
                }
            });
        }
        let leaf = self.descend(unit_interval(rng) * total);
        if self.replacement == Replacement::Without {
            self.clear_leaf(leaf);
        }
        self.drawn += 1;
        Ok(leaf - self.leaf_base)
    }

    fn reset(&mut self, weights: &[f64]) -> Result<(), SamplerError> {
        validate_weights(weights)?;
        self.len = weights.len();
        self.leaf_base = weights.len().next_power_of_two();
        self.drawn = 0;
        self.sums.clear();
        self.sums.resize(2 * self.leaf_base, 0.0);
        self.sums[self.leaf_base..self.leaf_base + weights.len()].copy_from_slice(weights);
        for node in (1..self.leaf_base).rev() {
            self.sums[node] = self.sums[2 * node] + self.sums[2 * node + 1];
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.len
    }
}
