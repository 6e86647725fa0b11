//! Matchups and fitness for one generation
//!
//! Agents are shuffled and paired two at a time. With an odd population the
//! last agent plays one extra matchup against a random other agent.

use rand::Rng;
use stratlab_core::PayoffResolver;

use crate::population::Population;

/// Payoff totals accumulated per strategy during a generation
#[derive(Clone, Debug, PartialEq)]
pub struct MatchupTally {
    /// Sum of payoffs earned by agents of each strategy
    pub payoff: Vec<f64>,
    /// Number of matchup sides played by each strategy
    pub matchups: Vec<usize>,
}

impl MatchupTally {
    pub fn new(strategies: usize) -> Self {
        Self {
            payoff: vec![0.0; strategies],
            matchups: vec![0; strategies],
        }
    }

    fn record(&mut self, strategy: usize, payoff: f64) {
        self.payoff[strategy] += payoff;
        self.matchups[strategy] += 1;
    }

    /// Average payoff per matchup for each strategy (0 when it never played)
    pub fn fitness(&self) -> Vec<f64> {
        self.payoff
            .iter()
            .zip(&self.matchups)
            .map(|(&total, &n)| if n == 0 { 0.0 } else { total / n as f64 })
            .collect()
    }

    pub fn total_matchups(&self) -> usize {
        self.matchups.iter().sum()
    }
}

/// Shuffle, pair, and play every matchup for the generation
pub fn play_matchups<R: Rng>(
    population: &mut Population,
    resolver: &PayoffResolver<'_>,
    rng: &mut R,
) -> MatchupTally {
    population.shuffle(rng);

    let strategies = population.strategies();
    let agents = population.agents();
    let mut tally = MatchupTally::new(strategies.len());

    let mut play = |a: usize, b: usize, rng: &mut R| {
        let (payoff_a, payoff_b) = resolver.resolve_pair(&strategies[a], &strategies[b], rng);
        tally.record(a, payoff_a);
        tally.record(b, payoff_b);
    };

    for pair in agents.chunks_exact(2) {
        play(pair[0], pair[1], rng);
    }

    if agents.len() % 2 == 1 && agents.len() > 1 {
        let leftover = agents.len() - 1;
        let opponent = rng.gen_range(0..leftover);
        play(agents[leftover], agents[opponent], rng);
    }

    tally
}

/// Population-wide fitness, weighted by agent counts
pub fn average_fitness(counts: &[usize], fitness: &[f64]) -> f64 {
    let agents: usize = counts.iter().sum();
    if agents == 0 {
        return 0.0;
    }
    let weighted: f64 = counts
        .iter()
        .zip(fitness)
        .map(|(&count, &f)| count as f64 * f)
        .sum();
    weighted / agents as f64
}
