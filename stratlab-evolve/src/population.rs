//! Population management
//!
//! Agents carry nothing but the index of the strategy they play.

use rand::seq::SliceRandom;
use rand::Rng;
use stratlab_core::{uniform_index, StrategyName};

/// Split `size` as evenly as possible over `n` strategies
///
/// Leftover units go to the earliest strategies.
pub fn even_counts(size: usize, n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let base = size / n;
    let extra = size % n;
    (0..n).map(|i| base + usize::from(i < extra)).collect()
}

/// Fixed-size population of strategy-tagged agents
#[derive(Clone, Debug)]
pub struct Population {
    strategies: Vec<StrategyName>,
    agents: Vec<usize>,
    size: usize,
}

impl Population {
    /// Even split over `strategies`, shuffled
    pub fn initialize<R: Rng>(strategies: Vec<StrategyName>, size: usize, rng: &mut R) -> Self {
        let counts = even_counts(size, strategies.len());
        let mut population = Self {
            strategies,
            agents: Vec::with_capacity(size),
            size,
        };
        population.rebuild(&counts, rng);
        population
    }

    pub fn strategies(&self) -> &[StrategyName] {
        &self.strategies
    }

    pub fn agents(&self) -> &[usize] {
        &self.agents
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Agents per strategy, in strategy order
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.strategies.len()];
        for &agent in &self.agents {
            counts[agent] += 1;
        }
        counts
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.agents.shuffle(rng);
    }

    /// Replace the agents with `counts`, forcing the length back to `size`
    ///
    /// Missing agents are drawn uniformly; surplus agents are cut from the end.
    /// The result is shuffled.
    pub fn rebuild<R: Rng>(&mut self, counts: &[usize], rng: &mut R) {
        self.agents.clear();
        for (strategy, &count) in counts.iter().enumerate().take(self.strategies.len()) {
            self.agents.extend(std::iter::repeat(strategy).take(count));
        }

        if self.agents.len() != self.size {
            tracing::debug!(
                agents = self.agents.len(),
                size = self.size,
                "correcting population size drift"
            );
        }
        while self.agents.len() < self.size && !self.strategies.is_empty() {
            self.agents.push(uniform_index(self.strategies.len(), rng));
        }
        self.agents.truncate(self.size);

        self.shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn strategies(n: usize) -> Vec<StrategyName> {
        (0..n).map(|i| StrategyName::new(format!("s{}", i))).collect()
    }

    #[test]
    fn test_even_counts() {
        assert_eq!(even_counts(10, 3), vec![4, 3, 3]);
        assert_eq!(even_counts(2, 3), vec![1, 1, 0]);
        assert_eq!(even_counts(9, 3), vec![3, 3, 3]);
        assert!(even_counts(5, 0).is_empty());
    }

    #[test]
    fn test_initialize_distributes_evenly() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let population = Population::initialize(strategies(3), 101, &mut rng);
        assert_eq!(population.agents().len(), 101);
        assert_eq!(population.counts(), vec![34, 34, 33]);
    }

    #[test]
    fn test_rebuild_pads_short_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut population = Population::initialize(strategies(2), 10, &mut rng);
        population.rebuild(&[3, 4], &mut rng);
        assert_eq!(population.agents().len(), 10);
        let counts = population.counts();
        assert!(counts[0] >= 3 && counts[1] >= 4);
    }

    #[test]
    fn test_rebuild_truncates_long_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut population = Population::initialize(strategies(2), 10, &mut rng);
        population.rebuild(&[8, 8], &mut rng);
        assert_eq!(population.agents().len(), 10);
        assert_eq!(population.counts().iter().sum::<usize>(), 10);
    }
}
