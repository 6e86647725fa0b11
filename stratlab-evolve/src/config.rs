//! Population evolution configuration

use serde::{Deserialize, Serialize};
use stratlab_core::error::{require_positive, require_unit};
use stratlab_core::ConfigError;

/// Population evolution configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of agents, constant across generations
    pub population_size: usize,
    /// Number of generations to run
    pub generations: usize,
    /// Fraction of each strategy's agents reassigned at random after selection
    pub mutation_rate: f64,
    /// Exponent on fitness in the reproduction weights (0 = drift, 1 = proportional)
    pub selection_pressure: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 50,
            mutation_rate: 0.01,
            selection_pressure: 1.0,
        }
    }
}

impl PopulationConfig {
    /// Create a validated config
    pub fn new(
        population_size: usize,
        generations: usize,
        mutation_rate: f64,
        selection_pressure: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            population_size,
            generations,
            mutation_rate,
            selection_pressure,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check counts and probabilities before a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("population_size", self.population_size)?;
        require_positive("generations", self.generations)?;
        require_unit("mutation_rate", self.mutation_rate)?;
        require_unit("selection_pressure", self.selection_pressure)?;
        Ok(())
    }

    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.population_size = population_size;
        self
    }

    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_mutation_rate(mut self, mutation_rate: f64) -> Self {
        self.mutation_rate = mutation_rate;
        self
    }

    pub fn with_selection_pressure(mut self, selection_pressure: f64) -> Self {
        self.selection_pressure = selection_pressure;
        self
    }
}
