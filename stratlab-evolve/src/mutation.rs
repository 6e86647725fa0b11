//! Mutation - random reassignment of a fraction of each strategy's agents
//!
//! For each strategy in order, `count * rate` is rounded stochastically (the
//! fractional part is the chance of rounding up), that many agents are removed,
//! and each is given a uniformly random strategy, possibly its own.

use rand::Rng;
use stratlab_core::uniform_index;

/// Stochastic rounding: `floor(x)` plus one with probability `fract(x)`
pub fn stochastic_round<R: Rng>(x: f64, rng: &mut R) -> usize {
    if x <= 0.0 || !x.is_finite() {
        return 0;
    }
    let floor = x.floor();
    let up = rng.gen::<f64>() < x - floor;
    floor as usize + usize::from(up)
}

/// Mutate `counts` in place. Returns how many agents were reassigned.
///
/// Reassigned agents land after every strategy has been processed, so no
/// agent is mutated twice in one generation.
pub fn mutate_counts<R: Rng>(counts: &mut [usize], mutation_rate: f64, rng: &mut R) -> usize {
    if counts.is_empty() {
        return 0;
    }

    let mut arrivals = vec![0usize; counts.len()];
    let mut moved = 0;

    for count in counts.iter_mut() {
        let leaving = stochastic_round(*count as f64 * mutation_rate, rng).min(*count);
        *count -= leaving;
        for _ in 0..leaving {
            let target = uniform_index(arrivals.len(), rng);
            arrivals[target] += 1;
        }
        moved += leaving;
    }

    for (count, arrived) in counts.iter_mut().zip(arrivals) {
        *count += arrived;
    }

    moved
}
