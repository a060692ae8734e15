//! Alias-method sampler.

use std::collections::VecDeque;

use rand::Rng;

use crate::error::SamplerError;

use super::{CategoricalSampler, Population, Replacement, unit_interval};

/// Samples with the alias method: O(n) build, O(1) draw with replacement.
///
/// Each table slot holds a threshold and an alias. A draw picks a slot
/// uniformly, then keeps it when a uniform offset falls below the threshold
/// and takes the alias otherwise.
#[derive(Clone, Debug)]
pub struct AliasSampler {
    population: Population,
    threshold: Vec<f64>,
    alias: Vec<usize>,
    mean: f64,
}

impl AliasSampler {
    /// Builds an alias table over `weights`.
    ///
    /// # Errors
    /// Returns [`SamplerError::EmptyDistribution`] or
    /// [`SamplerError::InvalidWeight`] when `weights` is rejected.
    pub fn new(weights: &[f64], replacement: Replacement) -> Result<Self, SamplerError> {
        let mut sampler = Self {
            population: Population::new(weights, replacement)?,
            threshold: Vec::new(),
            alias: Vec::new(),
            mean: 0.0,
        };
        sampler.rebuild_table();
        Ok(sampler)
    }

    /// Pairs under-full slots with over-full ones against the mean weight.
    fn rebuild_table(&mut self) {
        let live = self.population.live();
        let slots = live.len();
        self.threshold.clear();
        self.alias.clear();
        if slots == 0 {
            self.mean = 0.0;
            return;
        }
        self.mean = self.population.accumulated() / slots as f64;
        self.threshold.resize(slots, self.mean);
        self.alias.extend(0..slots);

        let mut under = VecDeque::new();
        let mut over = VecDeque::new();
        for (slot, &index) in live.iter().enumerate() {
            let weight = self.population.weight(index);
            if weight > self.mean {
                over.push_back((slot, weight));
            } else {
                under.push_back((slot, weight));
            }
        }

        while let (Some((small, small_weight)), Some((large, large_weight))) =
            (under.pop_front(), over.pop_front())
        {
            self.alias[small] = large;
            self.threshold[small] = small_weight;
            let residual = large_weight + small_weight - self.mean;
            if residual > self.mean {
                over.push_back((large, residual));
            } else if residual < self.mean {
                under.push_back((large, residual));
            }
        }
        // Leftovers in either queue keep `threshold == mean` and always accept
        // their own slot; zero-weight leftovers are rejected in `draw`.
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let slots = self.threshold.len();
        let dice = unit_interval(rng) * slots as f64;
        let slot = (dice as usize).min(slots - 1);
        let offset = (dice - slot as f64) * self.mean;
        let chosen = if offset < self.threshold[slot] {
            slot
        } else {
            self.alias[slot]
        };
        self.population.live()[chosen]
    }
}

impl CategoricalSampler for AliasSampler {
    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, SamplerError> {
        self.population.ensure_available()?;
        if self.population.needs_rebuild() {
            self.population.collect_live();
            self.rebuild_table();
        }
        loop {
            let candidate = self.pick(rng);
            if self.population.accept(candidate) {
                return Ok(candidate);
            }
        }
    }

    fn reset(&mut self, weights: &[f64]) -> Result<(), SamplerError> {
        self.population = Population::new(weights, self.population.replacement())?;
        self.rebuild_table();
        Ok(())
    }

    fn len(&self) -> usize {
        self.population.len()
    }
}
