//! Cumulative-distribution sampler.

use rand::Rng;

use crate::error::SamplerError;

use super::{CategoricalSampler, Population, Replacement, unit_interval};

/// Samples by bisecting a prefix-sum array: O(n) build, O(log n) draw.
#[derive(Clone, Debug)]
pub struct CdfSampler {
    population: Population,
    /// `cdf[0] == 0` and `cdf[i + 1] - cdf[i]` is the weight of `live[i]`.
    cdf: Vec<f64>,
}

impl CdfSampler {
    /// Builds the prefix sums over `weights`.
    ///
    /// # Errors
    /// Returns [`SamplerError::EmptyDistribution`] or
    /// [`SamplerError::InvalidWeight`] when `weights` is rejected.
    pub fn new(weights: &[f64], replacement: Replacement) -> Result<Self, SamplerError> {
        let mut sampler = Self {
            population: Population::new(weights, replacement)?,
            cdf: Vec::new(),
        };
        sampler.rebuild_cdf();
        Ok(sampler)
    }

    fn rebuild_cdf(&mut self) {
        self.cdf.clear();
        self.cdf.reserve(self.population.live().len() + 1);
        self.cdf.push(0.0);
        let mut running = 0.0;
        for &index in self.population.live() {
            running += self.population.weight(index);
            self.cdf.push(running);
        }
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total = self.cdf.last().copied().unwrap_or(0.0);
        let target = unit_interval(rng) * total;
        // `cdf[upper - 1] <= target < cdf[upper]`, so slot `upper - 1` carries
        // weight. `cdf[0] == 0 <= target` keeps `upper` at least one.
        let upper = self.cdf.partition_point(|&prefix| prefix <= target);
        let live = self.population.live();
        let slot = if upper < self.cdf.len() {
            upper - 1
        } else {
            // `target` rounded up to the total.
            live.iter()
                .rposition(|&index| self.population.is_available(index))
                .unwrap_or(upper - 1)
        };
        live[slot]
    }
}

impl CategoricalSampler for CdfSampler {
    fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, SamplerError> {
        self.population.ensure_available()?;
        if self.population.needs_rebuild() {
            self.population.collect_live();
            self.rebuild_cdf();
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
        self.rebuild_cdf();
        Ok(())
    }

    fn len(&self) -> usize {
        self.population.len()
    }
}
