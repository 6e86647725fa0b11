//! Random source construction and sampling helpers
//!
//! Every engine function takes `&mut R: Rng` explicitly. Nothing here keeps
//! global state, so independent runs can share nothing and still be reproducible.

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded generator, or entropy-seeded when no seed is given
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Uniform index in `0..len`. Returns 0 without drawing when `len` is 0.
pub fn uniform_index<R: Rng>(len: usize, rng: &mut R) -> usize {
    if len == 0 {
        0
    } else {
        rng.gen_range(0..len)
    }
}

/// Sample an index with probability proportional to `weights`
///
/// Negative and non-finite weights count as zero. If nothing has positive
/// weight the choice is uniform.
pub fn sample_weighted<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let clamped: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
        .collect();

    match WeightedIndex::new(&clamped) {
        Ok(dist) => dist.sample(rng),
        Err(_) => uniform_index(weights.len(), rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rng_with_seed() {
        let mut rng1 = create_rng(Some(42));
        let mut rng2 = create_rng(Some(42));
        assert_eq!(rng1.gen::<u64>(), rng2.gen::<u64>());
    }

    #[test]
    fn test_uniform_index_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(uniform_index(3, &mut rng) < 3);
        }
        assert_eq!(uniform_index(0, &mut rng), 0);
    }

    #[test]
    fn test_sample_weighted_skips_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let idx = sample_weighted(&[0.0, 2.0, -1.0, 1.0], &mut rng);
            assert!(idx == 1 || idx == 3, "picked zero-weight index {}", idx);
        }
    }

    #[test]
    fn test_sample_weighted_favors_heavy_weight() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let heavy = (0..1000)
            .filter(|_| sample_weighted(&[1.0, 9.0], &mut rng) == 1)
            .count();
        assert!(heavy > 800, "heavy weight picked only {} times", heavy);
    }

    #[test]
    fn test_sample_weighted_all_zero_is_uniform() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut seen = [false; 3];
        for _ in 0..100 {
            seen[sample_weighted(&[0.0, 0.0, 0.0], &mut rng)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_sample_weighted_ignores_non_finite_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let idx = sample_weighted(&[f64::NAN, 1.0, f64::INFINITY], &mut rng);
            assert_eq!(idx, 1);
        }
        assert_eq!(sample_weighted(&[], &mut rng), 0);
    }
}
