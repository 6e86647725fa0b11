//! Selection - reallocating the next generation by fitness
//!
//! Each strategy's reproductive weight is `count * max(fitness, 0.01)^pressure`.
//! Counts are allocated proportionally with the largest-remainder method so the
//! total always equals the population size.

use crate::population::even_counts;

/// Floor applied to fitness before exponentiation
pub const FITNESS_FLOOR: f64 = 0.01;

/// Reproductive weight for each strategy
pub fn reproduction_weights(counts: &[usize], fitness: &[f64], selection_pressure: f64) -> Vec<f64> {
    counts
        .iter()
        .zip(fitness)
        .map(|(&count, &f)| count as f64 * f.max(FITNESS_FLOOR).powf(selection_pressure))
        .collect()
}

/// Allocate `size` slots proportionally to `weights`
///
/// Returns `None` when the total weight is not positive.
pub fn allocate(weights: &[f64], size: usize) -> Option<Vec<usize>> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }

    let shares: Vec<f64> = weights.iter().map(|w| w / total * size as f64).collect();
    let mut counts: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let allocated: usize = counts.iter().sum();

    // Stable sort keeps iteration order among equal remainders
    let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });

    let remaining = size.saturating_sub(allocated);
    for &i in by_remainder.iter().cycle().take(remaining) {
        counts[i] += 1;
    }

    Some(counts)
}

/// Next generation's counts before mutation
///
/// Falls back to an even split when no strategy has weight.
pub fn next_counts(counts: &[usize], fitness: &[f64], selection_pressure: f64, size: usize) -> Vec<usize> {
    let weights = reproduction_weights(counts, fitness, selection_pressure);
    allocate(&weights, size).unwrap_or_else(|| {
        tracing::debug!("no reproductive weight, resetting to even split");
        even_counts(size, counts.len())
    })
}
