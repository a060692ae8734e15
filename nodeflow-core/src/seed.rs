//! Per-task RNG derivation.
//!
//! Parallel stages never share a generator. Each task derives its own
//! [`SmallRng`] from the base seed and its task index, so results for a fixed
//! base seed do not depend on how rayon schedules the work.

use rand::{SeedableRng, rngs::SmallRng};

/// SplitMix64 increment (the 64-bit golden ratio) used for per-task seed
/// derivation.
const TASK_SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

#[inline]
pub(crate) fn mix_task_seed(base_seed: u64, task_index: usize) -> u64 {
    splitmix64(base_seed ^ ((task_index as u64).wrapping_add(1).wrapping_mul(TASK_SEED_SPACING)))
}

#[inline]
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(TASK_SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

/// Builds the generator owned by task `task_index`.
pub(crate) fn task_rng(base_seed: u64, task_index: usize) -> SmallRng {
    SmallRng::seed_from_u64(mix_task_seed(base_seed, task_index))
}

/// Draws a base seed from OS entropy for callers that did not pin one.
pub(crate) fn entropy_seed() -> u64 {
    rand::random()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::RngCore;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0)]
    #[case(42)]
    #[case(u64::MAX)]
    fn task_seeds_are_distinct(#[case] base: u64) {
        let seeds: HashSet<_> = (0..1_024).map(|idx| mix_task_seed(base, idx)).collect();
        assert_eq!(seeds.len(), 1_024);
    }

    #[test]
    fn task_rng_is_reproducible() {
        let mut first = task_rng(7, 3);
        let mut second = task_rng(7, 3);
        let a: Vec<u64> = (0..8).map(|_| first.next_u64()).collect();
        let b: Vec<u64> = (0..8).map(|_| second.next_u64()).collect();
        assert_eq!(a, b);
    }
}
