//! Stratlab Evolution - population dynamics over strategies
//!
//! This crate provides the generation-based engine:
//! - Population management (even initialization, size correction)
//! - Random pairwise matchups and per-strategy fitness
//! - Selection (fitness-proportional, largest-remainder allocation)
//! - Mutation operators
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_population_simulation (orchestration)
//! - Level 2: PopulationEngine::step (phases)
//! - Level 3: play_matchups, next_counts, mutate_counts (steps)
//! - Level 4: configuration, population bookkeeping

pub mod config;
pub mod engine;
pub mod insights;
pub mod matchups;
pub mod mutation;
pub mod population;
pub mod selection;

pub use config::PopulationConfig;
pub use engine::{
    run_population_simulation, run_population_simulation_seeded, EvolutionPhase,
    PopulationEngine, PopulationGeneration, PopulationResult, StrategyStats,
};
pub use insights::synthesize_population_insights;
pub use matchups::{average_fitness, play_matchups, MatchupTally};
pub use mutation::{mutate_counts, stochastic_round};
pub use population::{even_counts, Population};
pub use selection::{allocate, next_counts, reproduction_weights, FITNESS_FLOOR};
