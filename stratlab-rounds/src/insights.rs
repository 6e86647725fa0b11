//! Human-readable observations about a round simulation

use stratlab_core::{GameAnalysis, PlayerId};

use crate::config::SimulationConfig;
use crate::convergence::{Convergence, CONVERGENCE_WINDOW};
use crate::simulation::{PolicyAssignment, SimulationRound};

/// Summarize leader, strategy usage, convergence and noise
pub fn synthesize_round_insights(
    analysis: &GameAnalysis,
    config: &SimulationConfig,
    rounds: &[SimulationRound],
    convergence: &Convergence,
    assignments: &[PolicyAssignment],
) -> Vec<String> {
    let Some(last) = rounds.last() else {
        return vec!["No rounds were played.".to_string()];
    };

    let mut insights = Vec::new();

    if let Some((leader, total)) = leader(last) {
        insights.push(format!(
            "{} finished with the highest cumulative payoff ({:.1}).",
            analysis.label_of(leader),
            total
        ));
    }

    if let Some(line) = strategy_usage(rounds) {
        insights.push(line);
    }

    if convergence.converged {
        let profile: Vec<String> = convergence
            .profile
            .iter()
            .map(|(player, strategy)| format!("{} → {}", analysis.label_of(player), strategy))
            .collect();
        insights.push(format!(
            "Strategies stabilized from round {} ({}).",
            convergence.equilibrium_round.unwrap_or(1),
            profile.join(", ")
        ));
    } else if rounds.len() < CONVERGENCE_WINDOW {
        insights.push(format!(
            "Too few rounds to test for convergence (need at least {}).",
            CONVERGENCE_WINDOW
        ));
    } else {
        insights.push("No stable strategy profile emerged.".to_string());
    }

    if config.noise > 0.0 {
        let perturbed: usize = rounds.iter().map(|r| r.perturbed.len()).sum();
        let decisions: usize = rounds.iter().map(|r| r.choices.len()).sum();
        if decisions > 0 {
            insights.push(format!(
                "Noise overrode {} of {} decisions ({:.0}%).",
                perturbed,
                decisions,
                100.0 * perturbed as f64 / decisions as f64
            ));
        }
    }

    if let Some(line) = best_policy(last, assignments) {
        insights.push(line);
    }

    insights
}

fn leader(round: &SimulationRound) -> Option<(&PlayerId, f64)> {
    let mut best: Option<(&PlayerId, f64)> = None;
    for (player, &total) in &round.cumulative {
        if best.map_or(true, |(_, b)| total > b) {
            best = Some((player, total));
        }
    }
    best
}

fn strategy_usage(rounds: &[SimulationRound]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut total = 0usize;
    for round in rounds {
        for strategy in round.choices.values() {
            total += 1;
            match counts.iter_mut().find(|(name, _)| *name == strategy.as_str()) {
                Some((_, n)) => *n += 1,
                None => counts.push((strategy.as_str(), 1)),
            }
        }
    }

    let (name, n) = counts
        .iter()
        .copied()
        .fold(None, |best: Option<(&str, usize)>, (name, n)| match best {
            Some((_, b)) if b >= n => best,
            _ => Some((name, n)),
        })?;

    Some(format!(
        "\"{}\" was the most played strategy ({:.0}% of choices).",
        name,
        100.0 * n as f64 / total as f64
    ))
}

/// Only meaningful when players ran different policies
fn best_policy(last: &SimulationRound, assignments: &[PolicyAssignment]) -> Option<String> {
    let first = assignments.first()?.policy;
    if assignments.iter().all(|a| a.policy == first) {
        return None;
    }

    let mut best: Option<(&PolicyAssignment, f64)> = None;
    for assignment in assignments {
        let total = last.cumulative.get(&assignment.player).copied().unwrap_or(0.0);
        if best.map_or(true, |(_, b)| total > b) {
            best = Some((assignment, total));
        }
    }

    best.map(|(assignment, _)| {
        format!("The {} policy earned the most in this mix.", assignment.policy)
    })
}
