//! Human-readable observations about a population run

use stratlab_core::StrategyName;

use crate::config::PopulationConfig;
use crate::engine::PopulationGeneration;

/// Summarize dominance, extinctions, fitness leaders and the selection regime
pub fn synthesize_population_insights(
    config: &PopulationConfig,
    generations: &[PopulationGeneration],
    dominant: Option<&StrategyName>,
    extinct: &[StrategyName],
) -> Vec<String> {
    let (Some(first), Some(last)) = (generations.first(), generations.last()) else {
        return vec!["No generations were simulated.".to_string()];
    };

    let mut insights = Vec::new();
    let total = last.total_count().max(1) as f64;

    if let Some(dominant) = dominant {
        let start = first.count_of(dominant) as f64 / first.total_count().max(1) as f64;
        let end = last.count_of(dominant) as f64 / total;
        insights.push(format!(
            "{} dominates the final population ({:.0}% of agents, up from {:.0}%).",
            dominant,
            100.0 * end,
            100.0 * start
        ));
    }

    if !extinct.is_empty() {
        let names: Vec<String> = extinct.iter().map(|s| s.to_string()).collect();
        insights.push(format!("Driven to extinction: {}.", names.join(", ")));
    }

    if let Some(fittest) = fittest(generations) {
        insights.push(format!(
            "{} had the highest average fitness across generations ({:.2}).",
            fittest.0, fittest.1
        ));
    }

    insights.push(format!(
        "Average fitness moved from {:.2} to {:.2}.",
        first.average_fitness, last.average_fitness
    ));

    if config.selection_pressure == 0.0 {
        insights.push("Selection pressure is zero, so changes reflect drift and mutation only.".to_string());
    } else if config.mutation_rate > 0.0 && extinct.is_empty() && last.strategies.len() > 1 {
        insights.push("Mutation kept every strategy in circulation.".to_string());
    }

    insights
}

/// Strategy with the best mean fitness over generations where it had agents
fn fittest(generations: &[PopulationGeneration]) -> Option<(&StrategyName, f64)> {
    let strategies = &generations.first()?.strategies;
    let mut best: Option<(&StrategyName, f64)> = None;

    for stats in strategies {
        let present: Vec<f64> = generations
            .iter()
            .filter_map(|g| g.stats_of(&stats.strategy))
            .filter(|s| s.matchups > 0)
            .map(|s| s.fitness)
            .collect();
        if present.is_empty() {
            continue;
        }
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        if best.map_or(true, |(_, b)| mean > b) {
            best = Some((&stats.strategy, mean));
        }
    }

    best
}
