//! Population command - evolutionary dynamics over the scenario's strategies
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), report_results()
//! - Level 3: (delegated to stratlab-evolve crate)
//! - Level 4: argument parsing, formatting

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stratlab_core::{create_rng, GameAnalysis};
use stratlab_evolve::{run_population_simulation, PopulationConfig, PopulationResult};

use crate::output::{emit, OutputArgs};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PopulationArgs {
    /// Scenario JSON file (a parsed game analysis)
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Population size
    #[arg(long, default_value = "100")]
    pub size: usize,

    /// Number of generations to run
    #[arg(long, default_value = "50")]
    pub generations: usize,

    /// Mutation rate (0.0-1.0)
    #[arg(long, default_value = "0.01")]
    pub mutation_rate: f64,

    /// Selection pressure (0.0 = drift, 1.0 = proportional)
    #[arg(long, default_value = "1.0")]
    pub selection_pressure: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run population command
///
/// 1. Load the scenario
/// 2. Build and validate the configuration
/// 3. Evolve
/// 4. Report
pub fn run(args: PopulationArgs, seed: Option<u64>) -> Result<()> {
    let analysis = GameAnalysis::load(&args.scenario)?;
    let config = build_config(&args)?;

    let mut rng = create_rng(seed);
    let result = run_population_simulation(&analysis, &config, &mut rng);

    report_results(&result, &args.output)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Map command arguments onto a validated population config
pub fn build_config(args: &PopulationArgs) -> Result<PopulationConfig> {
    PopulationConfig::new(
        args.size,
        args.generations,
        args.mutation_rate,
        args.selection_pressure,
    )
    .context("Invalid population settings")
}

fn report_results(result: &PopulationResult, output: &OutputArgs) -> Result<()> {
    if !output.json {
        print_text_results(result);
    }
    emit(result, output)
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn print_text_results(result: &PopulationResult) {
    println!(
        "\n=== Population Evolution ({} agents, {} generations) ===",
        result.config.population_size,
        result.generations.len()
    );

    if let Some(last) = result.final_generation() {
        println!("\n{:<20} {:>8} {:>10}", "Strategy", "Agents", "Fitness");
        for stats in &last.strategies {
            println!("{:<20} {:>8} {:>10.3}", stats.strategy.as_str(), stats.count, stats.fitness);
        }
        println!("\nAverage fitness: {:.3}", last.average_fitness);
    }

    if let Some(dominant) = &result.dominant_strategy {
        println!("Dominant strategy: {}", dominant);
    }

    println!("\nInsights:");
    for insight in &result.insights {
        println!("  - {}", insight);
    }
}
