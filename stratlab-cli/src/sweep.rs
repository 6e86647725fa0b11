//! Sweep command - many independently seeded round simulations
//!
//! Trial `i` runs on seed `base + i`, so any single trial can be replayed with
//! `stratlab rounds --seed <base + i>`.
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_trials(), summarize()
//! - Level 3: (delegated to stratlab-rounds crate)
//! - Level 4: argument parsing, formatting

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;
use serde::Serialize;

use stratlab_core::{GameAnalysis, PlayerId, StrategyProfile};
use stratlab_rounds::{
    run_round_simulation_seeded, PolicyMode, SimulationConfig, SimulationResult,
};

use crate::output::{emit, OutputArgs};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SweepArgs {
    /// Scenario JSON file (a parsed game analysis)
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Number of seeded trials
    #[arg(long, default_value = "32")]
    pub trials: usize,

    /// Number of rounds per trial
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

/// Final profile shared by several trials
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileCount {
    pub profile: StrategyProfile,
    pub trials: usize,
}

/// Aggregate over all trials of a sweep
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepSummary {
    pub trials: usize,
    pub base_seed: u64,
    pub converged_trials: usize,
    pub convergence_rate: f64,
    /// Mean equilibrium round over converged trials
    pub mean_equilibrium_round: Option<f64>,
    /// Most frequent final-round profile (first seen wins ties)
    pub common_final_profile: Option<ProfileCount>,
    /// Mean final cumulative payoff per player
    pub mean_final_payoff: BTreeMap<PlayerId, f64>,
    pub config: SimulationConfig,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run sweep command
pub fn run(args: SweepArgs, seed: Option<u64>) -> Result<()> {
    if args.trials == 0 {
        anyhow::bail!("--trials must be at least 1");
    }

    let analysis = GameAnalysis::load(&args.scenario)?;
    let policy: PolicyMode = args.policy.parse()?;
    let config = SimulationConfig::new(args.rounds, args.noise, args.learning_rate, policy)
        .context("Invalid round simulation settings")?;

    let base_seed = seed.unwrap_or_else(rand::random);
    tracing::info!(trials = args.trials, base_seed, "starting sweep");

    let results = run_trials(&analysis, &config, args.trials, base_seed);
    let summary = summarize(&results, base_seed, &config);

    if !args.output.json {
        print_text_summary(&analysis, &summary);
    }
    emit(&summary, &args.output)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Execute trials in parallel using rayon; results come back in trial order
pub fn run_trials(
    analysis: &GameAnalysis,
    config: &SimulationConfig,
    trials: usize,
    base_seed: u64,
) -> Vec<SimulationResult> {
    (0..trials)
        .into_par_iter()
        .map(|i| run_round_simulation_seeded(analysis, config, base_seed.wrapping_add(i as u64)))
        .collect()
}

pub fn summarize(results: &[SimulationResult], base_seed: u64, config: &SimulationConfig) -> SweepSummary {
    let trials = results.len();

    let equilibrium_rounds: Vec<usize> = results
        .iter()
        .filter(|r| r.convergence.converged)
        .filter_map(|r| r.convergence.equilibrium_round)
        .collect();
    let converged_trials = results.iter().filter(|r| r.convergence.converged).count();

    let mean_equilibrium_round = if equilibrium_rounds.is_empty() {
        None
    } else {
        Some(equilibrium_rounds.iter().sum::<usize>() as f64 / equilibrium_rounds.len() as f64)
    };

    SweepSummary {
        trials,
        base_seed,
        converged_trials,
        convergence_rate: if trials == 0 { 0.0 } else { converged_trials as f64 / trials as f64 },
        mean_equilibrium_round,
        common_final_profile: common_final_profile(results),
        mean_final_payoff: mean_final_payoff(results),
        config: config.clone(),
    }
}

// ============================================================================
// LEVEL 4 - AGGREGATION HELPERS
// ============================================================================

fn common_final_profile(results: &[SimulationResult]) -> Option<ProfileCount> {
    let mut counts: Vec<ProfileCount> = Vec::new();
    for profile in results.iter().filter_map(|r| r.final_round()).map(|r| &r.choices) {
        match counts.iter_mut().find(|c| &c.profile == profile) {
            Some(entry) => entry.trials += 1,
            None => counts.push(ProfileCount {
                profile: profile.clone(),
                trials: 1,
            }),
        }
    }

    let mut best: Option<ProfileCount> = None;
    for entry in counts {
        if best.as_ref().map_or(true, |b| entry.trials > b.trials) {
            best = Some(entry);
        }
    }
    best
}

fn mean_final_payoff(results: &[SimulationResult]) -> BTreeMap<PlayerId, f64> {
    let mut totals: BTreeMap<PlayerId, (f64, usize)> = BTreeMap::new();
    for round in results.iter().filter_map(|r| r.final_round()) {
        for (player, total) in &round.cumulative {
            let entry = totals.entry(player.clone()).or_insert((0.0, 0));
            entry.0 += total;
            entry.1 += 1;
        }
    }
    totals
        .into_iter()
        .map(|(player, (sum, n))| (player, sum / n as f64))
        .collect()
}

fn print_text_summary(analysis: &GameAnalysis, summary: &SweepSummary) {
    println!(
        "\n=== Sweep ({} trials, seeds {}..{}) ===",
        summary.trials,
        summary.base_seed,
        summary.base_seed.wrapping_add(summary.trials as u64)
    );
    println!(
        "Converged: {}/{} ({:.1}%)",
        summary.converged_trials,
        summary.trials,
        summary.convergence_rate * 100.0
    );
    if let Some(round) = summary.mean_equilibrium_round {
        println!("Mean equilibrium round: {:.1}", round);
    }

    if let Some(common) = &summary.common_final_profile {
        let profile: Vec<String> = common
            .profile
            .iter()
            .map(|(player, strategy)| format!("{}={}", analysis.label_of(player), strategy))
            .collect();
        println!("Most common final profile ({} trials): {}", common.trials, profile.join(", "));
    }

    println!("\nMean final payoff:");
    for (player, mean) in &summary.mean_final_payoff {
        println!("  {:<20} {:>10.2}", analysis.label_of(player), mean);
    }
}
