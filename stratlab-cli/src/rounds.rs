//! Rounds command - repeated play between the scenario's players
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), report_results()
//! - Level 3: (delegated to stratlab-rounds crate)
//! - Level 4: argument parsing, formatting

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stratlab_core::{create_rng, GameAnalysis};
use stratlab_rounds::{run_round_simulation, PolicyMode, SimulationConfig, SimulationResult};

use crate::output::{emit, OutputArgs};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct RoundsArgs {
    /// Scenario JSON file (a parsed game analysis)
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Number of rounds to play
    #[arg(long, default_value = "50")]
    pub rounds: usize,

    /// Chance of replacing each choice with a random one (0.0-1.0)
    #[arg(long, default_value = "0.05")]
    pub noise: f64,

    /// Adaptive policy learning rate (0.0-1.0)
    #[arg(long, default_value = "0.1")]
    pub learning_rate: f64,

    /// Policy for every player, or "mixed" for round-robin assignment
    #[arg(long, default_value = "mixed")]
    pub policy: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run rounds command
///
/// 1. Load the scenario
/// 2. Build and validate the configuration
/// 3. Simulate
/// 4. Report
pub fn run(args: RoundsArgs, seed: Option<u64>) -> Result<()> {
    let analysis = GameAnalysis::load(&args.scenario)?;
    let config = build_config(&args)?;

    let mut rng = create_rng(seed);
    let result = run_round_simulation(&analysis, &config, &mut rng);

    report_results(&analysis, &result, &args.output)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Map command arguments onto a validated simulation config
pub fn build_config(args: &RoundsArgs) -> Result<SimulationConfig> {
    let policy: PolicyMode = args.policy.parse()?;
    SimulationConfig::new(args.rounds, args.noise, args.learning_rate, policy)
        .context("Invalid round simulation settings")
}

fn report_results(analysis: &GameAnalysis, result: &SimulationResult, output: &OutputArgs) -> Result<()> {
    if !output.json {
        print_text_results(analysis, result);
    }
    emit(result, output)
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn print_text_results(analysis: &GameAnalysis, result: &SimulationResult) {
    println!("\n=== Round Simulation ({} rounds, policy {}) ===", result.rounds.len(), result.config.policy);

    println!("\nPolicies:");
    for assignment in &result.assignments {
        println!("  {:<20} {}", analysis.label_of(&assignment.player), assignment.policy);
    }

    println!("\nStandings:");
    for (i, (player, total)) in result.standings().iter().enumerate() {
        println!("  #{} {:<20} {:>10.2}", i + 1, analysis.label_of(player), total);
    }

    println!("\nConvergence:");
    match result.convergence.equilibrium_round {
        Some(round) if result.convergence.converged => println!("  stable from round {}", round),
        _ => println!("  not converged"),
    }

    println!("\nInsights:");
    for insight in &result.insights {
        println!("  - {}", insight);
    }
}
