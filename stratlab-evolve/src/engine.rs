//! Population evolution engine
//!
//! Level 1 - Orchestration and Level 2 - Phases
//!
//! Each generation: count agents, play random pairwise matchups, record the
//! snapshot, reallocate counts by fitness, mutate, and rebuild the population.
//! Draw order per generation is: pairing shuffle, leftover opponent, matchup
//! payoffs, mutation (per strategy in order), padding, rebuild shuffle.

use rand::Rng;
use serde::{Deserialize, Serialize};
use stratlab_core::{GameAnalysis, PayoffResolver, StrategyName};

use crate::config::PopulationConfig;
use crate::insights::synthesize_population_insights;
use crate::matchups::{average_fitness, play_matchups};
use crate::mutation::mutate_counts;
use crate::population::Population;
use crate::selection::next_counts;

/// One strategy's standing within a generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub strategy: StrategyName,
    /// Agents playing this strategy at the start of the generation
    pub count: usize,
    /// Average payoff per matchup this generation
    pub fitness: f64,
    /// Matchup sides played this generation
    pub matchups: usize,
}

/// Snapshot of one generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationGeneration {
    /// 1-based generation number
    pub generation: usize,
    /// Per-strategy stats, in strategy order
    pub strategies: Vec<StrategyStats>,
    /// Count-weighted average fitness
    pub average_fitness: f64,
}

impl PopulationGeneration {
    pub fn count_of(&self, strategy: &StrategyName) -> usize {
        self.stats_of(strategy).map_or(0, |s| s.count)
    }

    pub fn stats_of(&self, strategy: &StrategyName) -> Option<&StrategyStats> {
        self.strategies.iter().find(|s| &s.strategy == strategy)
    }

    pub fn total_count(&self) -> usize {
        self.strategies.iter().map(|s| s.count).sum()
    }
}

/// Outcome of a population run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationResult {
    /// Every generation, in order
    pub generations: Vec<PopulationGeneration>,
    /// All strategies that took part
    pub strategies: Vec<StrategyName>,
    /// Most agents in the final generation (first on ties)
    pub dominant_strategy: Option<StrategyName>,
    /// Strategies with no agents in the final generation
    pub extinct_strategies: Vec<StrategyName>,
    /// Human-readable observations
    pub insights: Vec<String>,
    /// Configuration the run used
    pub config: PopulationConfig,
}

impl PopulationResult {
    pub fn final_generation(&self) -> Option<&PopulationGeneration> {
        self.generations.last()
    }

    /// Fraction of the final population playing `strategy`
    pub fn share_of(&self, strategy: &StrategyName) -> f64 {
        match self.final_generation() {
            Some(generation) if generation.total_count() > 0 => {
                generation.count_of(strategy) as f64 / generation.total_count() as f64
            }
            _ => 0.0,
        }
    }

    /// Fitness of `strategy` in every generation
    pub fn fitness_history(&self, strategy: &StrategyName) -> Vec<f64> {
        self.generations
            .iter()
            .map(|g| g.stats_of(strategy).map_or(0.0, |s| s.fitness))
            .collect()
    }

    /// Agent count of `strategy` in every generation
    pub fn count_history(&self, strategy: &StrategyName) -> Vec<usize> {
        self.generations.iter().map(|g| g.count_of(strategy)).collect()
    }
}

/// Lifecycle of a population engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvolutionPhase {
    Initializing,
    Evolving,
    Complete,
}

/// Generation-by-generation population simulator
pub struct PopulationEngine<'a> {
    config: &'a PopulationConfig,
    resolver: PayoffResolver<'a>,
    population: Population,
    generations: Vec<PopulationGeneration>,
    phase: EvolutionPhase,
}

impl<'a> PopulationEngine<'a> {
    /// Seed an evenly split, shuffled population over every strategy in the scenario
    pub fn new<R: Rng>(analysis: &'a GameAnalysis, config: &'a PopulationConfig, rng: &mut R) -> Self {
        let population =
            Population::initialize(analysis.strategy_universe(), config.population_size, rng);
        let mut engine = Self {
            config,
            resolver: PayoffResolver::new(&analysis.payoff_matrix),
            population,
            generations: Vec::with_capacity(config.generations),
            phase: EvolutionPhase::Initializing,
        };

        engine.phase = if config.generations == 0 {
            EvolutionPhase::Complete
        } else {
            EvolutionPhase::Evolving
        };
        engine
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn generations(&self) -> &[PopulationGeneration] {
        &self.generations
    }

    /// Run one generation. Returns `None` once all generations are done.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Option<&PopulationGeneration> {
        if self.phase != EvolutionPhase::Evolving {
            return None;
        }

        let counts = self.population.counts();
        let tally = play_matchups(&mut self.population, &self.resolver, rng);
        let fitness = tally.fitness();
        let snapshot = self.snapshot(&counts, &fitness, &tally.matchups);
        tracing::debug!(
            generation = snapshot.generation,
            average_fitness = snapshot.average_fitness,
            "generation complete"
        );
        self.generations.push(snapshot);

        let mut next = next_counts(
            &counts,
            &fitness,
            self.config.selection_pressure,
            self.config.population_size,
        );
        mutate_counts(&mut next, self.config.mutation_rate, rng);
        self.population.rebuild(&next, rng);

        if self.generations.len() >= self.config.generations {
            self.phase = EvolutionPhase::Complete;
        }
        self.generations.last()
    }

    /// Run every remaining generation and build the result
    pub fn run<R: Rng>(mut self, rng: &mut R) -> PopulationResult {
        while self.step(rng).is_some() {}
        self.finish()
    }

    /// Summarize the generations played so far
    pub fn finish(self) -> PopulationResult {
        let strategies = self.population.strategies().to_vec();
        let (dominant_strategy, extinct_strategies) = match self.generations.last() {
            Some(last) => (dominant(last), extinct(last)),
            None => (None, Vec::new()),
        };

        let insights = synthesize_population_insights(
            self.config,
            &self.generations,
            dominant_strategy.as_ref(),
            &extinct_strategies,
        );

        tracing::info!(
            generations = self.generations.len(),
            dominant = ?dominant_strategy.as_ref().map(|s| s.as_str()),
            extinct = extinct_strategies.len(),
            "population simulation finished"
        );

        PopulationResult {
            generations: self.generations,
            strategies,
            dominant_strategy,
            extinct_strategies,
            insights,
            config: self.config.clone(),
        }
    }

    fn snapshot(&self, counts: &[usize], fitness: &[f64], matchups: &[usize]) -> PopulationGeneration {
        let strategies = self
            .population
            .strategies()
            .iter()
            .enumerate()
            .map(|(i, strategy)| StrategyStats {
                strategy: strategy.clone(),
                count: counts[i],
                fitness: fitness[i],
                matchups: matchups[i],
            })
            .collect();

        PopulationGeneration {
            generation: self.generations.len() + 1,
            strategies,
            average_fitness: average_fitness(counts, fitness),
        }
    }
}

fn dominant(generation: &PopulationGeneration) -> Option<StrategyName> {
    let mut best: Option<&StrategyStats> = None;
    for stats in &generation.strategies {
        if best.map_or(true, |b| stats.count > b.count) {
            best = Some(stats);
        }
    }
    best.map(|s| s.strategy.clone())
}

fn extinct(generation: &PopulationGeneration) -> Vec<StrategyName> {
    generation
        .strategies
        .iter()
        .filter(|s| s.count == 0)
        .map(|s| s.strategy.clone())
        .collect()
}

/// Run a full population simulation
///
/// `config` is assumed valid (see [`PopulationConfig::validate`]). The analysis is
/// only read.
pub fn run_population_simulation<R: Rng>(
    analysis: &GameAnalysis,
    config: &PopulationConfig,
    rng: &mut R,
) -> PopulationResult {
    tracing::info!(
        population = config.population_size,
        generations = config.generations,
        mutation_rate = config.mutation_rate,
        selection_pressure = config.selection_pressure,
        "starting population simulation"
    );
    PopulationEngine::new(analysis, config, rng).run(rng)
}

/// Run a population simulation on a fresh `ChaCha8Rng` seeded with `seed`
pub fn run_population_simulation_seeded(
    analysis: &GameAnalysis,
    config: &PopulationConfig,
    seed: u64,
) -> PopulationResult {
    let mut rng = stratlab_core::create_rng(Some(seed));
    run_population_simulation(analysis, config, &mut rng)
}
