//! Replicator-dynamics mixed strategy
//!
//! One `ReplicatorState` per player, indexed parallel to that player's strategy
//! list. It lives only for the duration of a single simulation run.

use rand::Rng;
use stratlab_core::sample_weighted;

/// Floor applied to each hypothetical payoff before the update
pub const PAYOFF_FLOOR: f64 = 0.01;

/// Probability distribution over one player's strategies
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicatorState {
    probabilities: Vec<f64>,
}

impl ReplicatorState {
    /// Uniform distribution over `n` strategies
    pub fn uniform(n: usize) -> Self {
        let p = if n == 0 { 0.0 } else { 1.0 / n as f64 };
        Self {
            probabilities: vec![p; n],
        }
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Rescale so the probabilities sum to 1
    ///
    /// A collapsed (zero, negative or non-finite) total resets to uniform.
    pub fn normalize(&mut self) {
        for p in &mut self.probabilities {
            if !p.is_finite() || *p < 0.0 {
                *p = 0.0;
            }
        }
        let total: f64 = self.probabilities.iter().sum();
        if total > 0.0 && total.is_finite() {
            for p in &mut self.probabilities {
                *p /= total;
            }
        } else {
            *self = Self::uniform(self.probabilities.len());
        }
    }

    /// Apply one replicator step given the payoff each strategy would earn
    ///
    /// `p_i <- p_i * max(payoff_i, 0.01) / average`, where the average is the
    /// distribution-weighted raw payoff (taken as 1 when not positive).
    pub fn update(&mut self, payoffs: &[f64]) {
        if payoffs.len() != self.probabilities.len() {
            return;
        }

        let mut average: f64 = self
            .probabilities
            .iter()
            .zip(payoffs)
            .map(|(p, payoff)| p * payoff)
            .sum();
        if average <= 0.0 || !average.is_finite() {
            average = 1.0;
        }

        for (p, payoff) in self.probabilities.iter_mut().zip(payoffs) {
            *p *= payoff.max(PAYOFF_FLOOR) / average;
        }

        self.normalize();
    }

    /// Draw a strategy index from the current distribution
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        sample_weighted(&self.probabilities, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn assert_distribution(state: &ReplicatorState) {
        let total: f64 = state.probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "sum was {}", total);
        for &p in state.probabilities() {
            assert!((0.0..=1.0).contains(&p), "probability {} out of range", p);
        }
    }

    #[test]
    fn test_uniform() {
        let state = ReplicatorState::uniform(4);
        assert_eq!(state.probabilities(), &[0.25; 4]);
    }

    #[test]
    fn test_normalize_rescales() {
        let mut state = ReplicatorState { probabilities: vec![2.0, 6.0] };
        state.normalize();
        assert_eq!(state.probabilities(), &[0.25, 0.75]);
    }

    #[test]
    fn test_normalize_resets_collapsed_distribution() {
        let mut state = ReplicatorState { probabilities: vec![0.0, 0.0, 0.0] };
        state.normalize();
        assert_distribution(&state);
        assert!((state.probabilities()[0] - 1.0 / 3.0).abs() < 1e-12);

        let mut state = ReplicatorState { probabilities: vec![f64::NAN, -1.0] };
        state.normalize();
        assert_eq!(state.probabilities(), &[0.5, 0.5]);
    }

    #[test]
    fn test_update_moves_mass_toward_higher_payoff() {
        let mut state = ReplicatorState::uniform(2);
        state.update(&[1.0, 3.0]);
        assert_distribution(&state);
        assert!((state.probabilities()[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_update_with_negative_payoffs_stays_valid() {
        let mut state = ReplicatorState::uniform(3);
        for _ in 0..50 {
            state.update(&[-5.0, -1.0, 0.0]);
            assert_distribution(&state);
        }
    }

    #[test]
    fn test_update_ignores_mismatched_lengths() {
        let mut state = ReplicatorState::uniform(2);
        state.update(&[1.0, 2.0, 3.0]);
        assert_eq!(state.probabilities(), &[0.5, 0.5]);
    }

    #[test]
    fn test_sample_follows_distribution() {
        let mut state = ReplicatorState::uniform(2);
        for _ in 0..20 {
            state.update(&[0.1, 10.0]);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let picks = (0..200).filter(|_| state.sample(&mut rng) == 1).count();
        assert!(picks > 190, "expected near-certain pick, got {}", picks);
    }
}
