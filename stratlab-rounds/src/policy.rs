//! Strategy policies
//!
//! Level 3 - Steps
//!
//! Each policy maps (player, legal strategies, observable history) to one legal
//! strategy for the current round. Policies only ever see rounds strictly before
//! the one being decided.

use rand::Rng;
use rustc_hash::FxHashMap;
use stratlab_core::{
    position_of, uniform_index, PayoffResolver, PlayerId, StrategyName, DEFAULT_STRATEGIES,
};

use crate::config::PolicyKind;
use crate::replicator::ReplicatorState;
use crate::simulation::SimulationRound;

/// Everything a policy may observe when deciding
#[derive(Clone, Copy, Debug)]
pub struct DecisionContext<'a> {
    /// Player making the decision
    pub player: &'a PlayerId,
    /// That player's legal strategies (never empty)
    pub strategies: &'a [StrategyName],
    /// Completed rounds, oldest first
    pub history: &'a [SimulationRound],
    /// Every player id in the scenario, in list order
    pub players: &'a [PlayerId],
    /// Payoff table lookup
    pub resolver: PayoffResolver<'a>,
    /// Reinforcement step for the adaptive policy
    pub learning_rate: f64,
}

impl<'a> DecisionContext<'a> {
    pub fn previous(&self) -> Option<&'a SimulationRound> {
        self.history.last()
    }

    fn opponents(&self) -> impl Iterator<Item = &'a PlayerId> + '_ {
        self.players.iter().filter(move |p| *p != self.player)
    }
}

/// Run `kind` for one player and return its chosen strategy
///
/// `state` is only read or written by replicator dynamics. An empty strategy
/// list yields the first default strategy without drawing.
pub fn choose_strategy<R: Rng>(
    kind: PolicyKind,
    ctx: &DecisionContext<'_>,
    state: &mut ReplicatorState,
    rng: &mut R,
) -> StrategyName {
    let Some(last) = ctx.strategies.len().checked_sub(1) else {
        return StrategyName::from(DEFAULT_STRATEGIES[0]);
    };

    let index = match kind {
        PolicyKind::Random => uniform_index(ctx.strategies.len(), rng),
        PolicyKind::Greedy => greedy(ctx, rng),
        PolicyKind::TitForTat => tit_for_tat(ctx),
        PolicyKind::Adaptive => adaptive(ctx, rng),
        PolicyKind::BestResponse => best_response(ctx, ctx.previous(), rng),
        PolicyKind::FictitiousPlay => fictitious_play(ctx, rng),
        PolicyKind::ReplicatorDynamics => replicator_dynamics(ctx, state, rng),
    };
    ctx.strategies[index.min(last)].clone()
}

// ============================================================================
// Policies
// ============================================================================

fn greedy<R: Rng>(ctx: &DecisionContext<'_>, rng: &mut R) -> usize {
    match ctx.previous() {
        Some(previous) => argmax(&hypothetical_payoffs(ctx, previous, rng)),
        None => uniform_index(ctx.strategies.len(), rng),
    }
}

fn tit_for_tat(ctx: &DecisionContext<'_>) -> usize {
    // The first listed strategy is the cooperative default
    let Some(previous) = ctx.previous() else {
        return 0;
    };

    let mut tally: Vec<(&StrategyName, usize)> = Vec::new();
    for opponent in ctx.opponents() {
        let Some(played) = previous.choices.get(opponent) else {
            continue;
        };
        match tally.iter_mut().find(|(name, _)| name.matches(played)) {
            Some((_, count)) => *count += 1,
            None => tally.push((played, 1)),
        }
    }

    let mut most_common: Option<(&StrategyName, usize)> = None;
    for &(name, count) in &tally {
        if most_common.map_or(true, |(_, best)| count > best) {
            most_common = Some((name, count));
        }
    }

    most_common
        .and_then(|(name, _)| position_of(ctx.strategies, name))
        .unwrap_or(0)
}

fn adaptive<R: Rng>(ctx: &DecisionContext<'_>, rng: &mut R) -> usize {
    if ctx.history.is_empty() {
        return uniform_index(ctx.strategies.len(), rng);
    }

    let mut weights = vec![1.0; ctx.strategies.len()];
    for round in ctx.history {
        let Some(played) = round.choices.get(ctx.player) else {
            continue;
        };
        if let Some(i) = position_of(ctx.strategies, played) {
            let payoff = round.payoffs.get(ctx.player).copied().unwrap_or(0.0);
            weights[i] += payoff * ctx.learning_rate;
        }
    }

    stratlab_core::sample_weighted(&weights, rng)
}

fn best_response<R: Rng>(
    ctx: &DecisionContext<'_>,
    previous: Option<&SimulationRound>,
    rng: &mut R,
) -> usize {
    if let Some(previous) = previous {
        return argmax(&hypothetical_payoffs(ctx, previous, rng));
    }

    if ctx.resolver.is_empty() {
        return uniform_index(ctx.strategies.len(), rng);
    }

    let averages: Vec<f64> = ctx
        .strategies
        .iter()
        .map(|strategy| table_average(ctx, strategy))
        .collect();
    argmax(&averages)
}

fn fictitious_play<R: Rng>(ctx: &DecisionContext<'_>, rng: &mut R) -> usize {
    if ctx.history.is_empty() {
        return best_response(ctx, None, rng);
    }

    let frequencies = opponent_frequencies(ctx);
    let mut best: Option<(usize, f64)> = None;

    for (i, strategy) in ctx.strategies.iter().enumerate() {
        let Some(expected) = expected_payoff(ctx, strategy, &frequencies) else {
            continue;
        };
        if best.map_or(true, |(_, value)| expected > value) {
            best = Some((i, expected));
        }
    }

    match best {
        // Zero counts as "no information" and falls through to best response
        Some((index, value)) if value > 0.0 => index,
        _ => best_response(ctx, ctx.previous(), rng),
    }
}

fn replicator_dynamics<R: Rng>(
    ctx: &DecisionContext<'_>,
    state: &mut ReplicatorState,
    rng: &mut R,
) -> usize {
    if state.len() != ctx.strategies.len() {
        *state = ReplicatorState::uniform(ctx.strategies.len());
    }

    if let Some(previous) = ctx.previous() {
        let payoffs = hypothetical_payoffs(ctx, previous, rng);
        state.update(&payoffs);
    }

    state.sample(rng)
}

// ============================================================================
// Helpers
// ============================================================================

/// Payoff for each legal strategy if everyone else repeats `previous`
fn hypothetical_payoffs<R: Rng>(
    ctx: &DecisionContext<'_>,
    previous: &SimulationRound,
    rng: &mut R,
) -> Vec<f64> {
    ctx.strategies
        .iter()
        .map(|strategy| {
            let mut profile = previous.choices.clone();
            profile.insert(ctx.player.clone(), strategy.clone());
            ctx.resolver.payoff_for(ctx.player, &profile, rng)
        })
        .collect()
}

/// Average table payoff for the player across cells where it plays `strategy`
fn table_average(ctx: &DecisionContext<'_>, strategy: &StrategyName) -> f64 {
    let payoffs: Vec<f64> = ctx
        .resolver
        .table()
        .iter()
        .filter(|cell| cell.strategy_of(ctx.player).map_or(false, |s| s.matches(strategy)))
        .map(|cell| cell.payoff_of(ctx.player).unwrap_or(0.0))
        .collect();

    if payoffs.is_empty() {
        0.0
    } else {
        payoffs.iter().sum::<f64>() / payoffs.len() as f64
    }
}

/// Empirical frequency of each opponent's strategies, keyed by folded name
fn opponent_frequencies(ctx: &DecisionContext<'_>) -> FxHashMap<PlayerId, FxHashMap<String, f64>> {
    let mut frequencies = FxHashMap::default();

    for opponent in ctx.opponents() {
        let mut counts: FxHashMap<String, f64> = FxHashMap::default();
        let mut observed = 0usize;
        for round in ctx.history {
            if let Some(played) = round.choices.get(opponent) {
                *counts.entry(played.folded()).or_insert(0.0) += 1.0;
                observed += 1;
            }
        }
        if observed > 0 {
            for count in counts.values_mut() {
                *count /= observed as f64;
            }
        }
        frequencies.insert(opponent.clone(), counts);
    }

    frequencies
}

/// Frequency-weighted table payoff for playing `strategy`, if any cell carries weight
fn expected_payoff(
    ctx: &DecisionContext<'_>,
    strategy: &StrategyName,
    frequencies: &FxHashMap<PlayerId, FxHashMap<String, f64>>,
) -> Option<f64> {
    let mut weighted_total = 0.0;
    let mut total_weight = 0.0;

    for cell in ctx.resolver.table() {
        if !cell.strategy_of(ctx.player).map_or(false, |s| s.matches(strategy)) {
            continue;
        }

        let mut weight = 1.0;
        for opponent in ctx.opponents() {
            if let Some(played) = cell.strategy_of(opponent) {
                weight *= frequencies
                    .get(opponent)
                    .and_then(|f| f.get(&played.folded()))
                    .copied()
                    .unwrap_or(0.0);
            }
        }

        weighted_total += weight * cell.payoff_of(ctx.player).unwrap_or(0.0);
        total_weight += weight;
    }

    if total_weight > 0.0 {
        Some(weighted_total / total_weight)
    } else {
        None
    }
}

/// Index of the largest value; first wins ties, NaN never wins
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use stratlab_core::{GameAnalysis, PayoffCell, PayoffMap, StrategyProfile};

    fn ids() -> Vec<PlayerId> {
        vec![PlayerId::from("p1"), PlayerId::from("p2")]
    }

    fn names(list: &[&str]) -> Vec<StrategyName> {
        list.iter().map(|&s| StrategyName::from(s)).collect()
    }

    fn round(index: usize, p1: &str, p2: &str, pay1: f64, pay2: f64) -> SimulationRound {
        let choices: StrategyProfile = [
            (PlayerId::from("p1"), StrategyName::from(p1)),
            (PlayerId::from("p2"), StrategyName::from(p2)),
        ]
        .into_iter()
        .collect();
        let payoffs: PayoffMap = [(PlayerId::from("p1"), pay1), (PlayerId::from("p2"), pay2)]
            .into_iter()
            .collect();
        SimulationRound {
            round: index,
            choices,
            cumulative: payoffs.clone(),
            payoffs,
            perturbed: Vec::new(),
        }
    }

    fn decide(
        kind: PolicyKind,
        table: &[PayoffCell],
        history: &[SimulationRound],
        seed: u64,
    ) -> StrategyName {
        let players = ids();
        let strategies = names(&["Cooperate", "Defect"]);
        let ctx = DecisionContext {
            player: &players[0],
            strategies: &strategies,
            history,
            players: &players,
            resolver: PayoffResolver::new(table),
            learning_rate: 0.1,
        };
        let mut state = ReplicatorState::uniform(strategies.len());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        choose_strategy(kind, &ctx, &mut state, &mut rng)
    }

    #[test]
    fn test_argmax_first_on_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[f64::NAN, 0.5]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_greedy_defects_in_prisoners_dilemma() {
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        let history = vec![round(1, "Cooperate", "Cooperate", 3.0, 3.0)];
        assert_eq!(decide(PolicyKind::Greedy, &table, &history, 1).as_str(), "Defect");
    }

    #[test]
    fn test_tit_for_tat_opens_with_first_strategy() {
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        assert_eq!(decide(PolicyKind::TitForTat, &table, &[], 1).as_str(), "Cooperate");
    }

    #[test]
    fn test_tit_for_tat_mirrors_opponent() {
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        let history = vec![round(1, "Cooperate", "defect", 0.0, 5.0)];
        // Returns the player's own spelling
        assert_eq!(decide(PolicyKind::TitForTat, &table, &history, 1).as_str(), "Defect");
    }

    #[test]
    fn test_tit_for_tat_unknown_move_plays_default() {
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        let history = vec![round(1, "Defect", "Abstain", 1.0, 1.0)];
        assert_eq!(decide(PolicyKind::TitForTat, &table, &history, 1).as_str(), "Cooperate");
    }

    #[test]
    fn test_best_response_first_round_uses_table_average() {
        // Cooperate averages 1.5, Defect averages 3.0
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        assert_eq!(decide(PolicyKind::BestResponse, &table, &[], 1).as_str(), "Defect");
    }

    #[test]
    fn test_adaptive_reinforces_rewarded_strategy() {
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        let history: Vec<SimulationRound> = (1..=40)
            .map(|i| round(i, "Defect", "Cooperate", 5.0, 0.0))
            .collect();

        // Defect weight is 1 + 40 * 5 * 0.1 = 21 against 1 for Cooperate
        let defects = (0..100)
            .filter(|&seed| decide(PolicyKind::Adaptive, &table, &history, seed).as_str() == "Defect")
            .count();
        assert!(defects > 85, "adaptive picked Defect only {} times", defects);
    }

    #[test]
    fn test_fictitious_play_responds_to_frequencies() {
        // Against a habitual cooperator, Defect expects 5 and Cooperate expects 3
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        let history: Vec<SimulationRound> = (1..=5)
            .map(|i| round(i, "Cooperate", "Cooperate", 3.0, 3.0))
            .collect();
        assert_eq!(decide(PolicyKind::FictitiousPlay, &table, &history, 1).as_str(), "Defect");
    }

    #[test]
    fn test_fictitious_play_without_history_falls_back() {
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        assert_eq!(decide(PolicyKind::FictitiousPlay, &table, &[], 1).as_str(), "Defect");
    }

    #[test]
    fn test_fictitious_play_non_positive_expectation_uses_best_response() {
        // Every outcome costs p1. Against 3 Cooperates and 1 Defect the
        // frequencies favour Cooperate (-1.75 vs -2.75), but the best
        // expectation is not positive, so the last round decides:
        // Cooperate -4 vs Defect -2 against a defector.
        let table = vec![
            PayoffCell::from_entries(&[("p1", "Cooperate", -1.0), ("p2", "Cooperate", -1.0)]),
            PayoffCell::from_entries(&[("p1", "Cooperate", -4.0), ("p2", "Defect", -1.0)]),
            PayoffCell::from_entries(&[("p1", "Defect", -3.0), ("p2", "Cooperate", -1.0)]),
            PayoffCell::from_entries(&[("p1", "Defect", -2.0), ("p2", "Defect", -1.0)]),
        ];
        let mut history: Vec<SimulationRound> = (1..=3)
            .map(|i| round(i, "Cooperate", "Cooperate", -1.0, -1.0))
            .collect();
        history.push(round(4, "Cooperate", "Defect", -4.0, -1.0));

        let fictitious = decide(PolicyKind::FictitiousPlay, &table, &history, 1);
        let best = decide(PolicyKind::BestResponse, &table, &history, 1);
        assert_eq!(fictitious.as_str(), "Defect");
        assert_eq!(fictitious, best);
    }

    #[test]
    fn test_fictitious_play_unweighted_table_uses_best_response() {
        // The opponent only ever played a move the table never lists, so no
        // cell carries weight. Best response against that move reads the
        // first cell with our strategy: Cooperate 4, Defect 0.
        let table = vec![
            PayoffCell::from_entries(&[("p1", "Cooperate", 4.0), ("p2", "Cooperate", 4.0)]),
            PayoffCell::from_entries(&[("p1", "Cooperate", 0.0), ("p2", "Defect", 0.0)]),
            PayoffCell::from_entries(&[("p1", "Defect", 0.0), ("p2", "Cooperate", 0.0)]),
            PayoffCell::from_entries(&[("p1", "Defect", 2.0), ("p2", "Defect", 2.0)]),
        ];
        let history: Vec<SimulationRound> = (1..=3)
            .map(|i| round(i, "Defect", "Abstain", 0.0, 0.0))
            .collect();

        let players = ids();
        let strategies = names(&["Cooperate", "Defect"]);
        let ctx = DecisionContext {
            player: &players[0],
            strategies: &strategies,
            history: &history,
            players: &players,
            resolver: PayoffResolver::new(&table),
            learning_rate: 0.1,
        };
        let frequencies = opponent_frequencies(&ctx);
        for strategy in &strategies {
            assert_eq!(expected_payoff(&ctx, strategy, &frequencies), None);
        }

        let fictitious = decide(PolicyKind::FictitiousPlay, &table, &history, 1);
        assert_eq!(fictitious.as_str(), "Cooperate");
        assert_eq!(fictitious, decide(PolicyKind::BestResponse, &table, &history, 1));
    }

    #[test]
    fn test_tit_for_tat_three_players_first_opponent_wins_tie() {
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        let players = vec![PlayerId::from("p1"), PlayerId::from("p2"), PlayerId::from("p3")];
        let strategies = names(&["Cooperate", "Defect"]);

        let previous = |p2: &str, p3: &str| SimulationRound {
            round: 1,
            choices: [
                (PlayerId::from("p1"), StrategyName::from("Cooperate")),
                (PlayerId::from("p2"), StrategyName::from(p2)),
                (PlayerId::from("p3"), StrategyName::from(p3)),
            ]
            .into_iter()
            .collect(),
            payoffs: PayoffMap::new(),
            cumulative: PayoffMap::new(),
            perturbed: Vec::new(),
        };

        for (p2, p3, expected) in [
            ("Defect", "Cooperate", "Defect"),
            ("Cooperate", "Defect", "Cooperate"),
            ("defect", "DEFECT", "Defect"),
        ] {
            let history = vec![previous(p2, p3)];
            let ctx = DecisionContext {
                player: &players[0],
                strategies: &strategies,
                history: &history,
                players: &players,
                resolver: PayoffResolver::new(&table),
                learning_rate: 0.1,
            };
            let mut state = ReplicatorState::uniform(2);
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let chosen = choose_strategy(PolicyKind::TitForTat, &ctx, &mut state, &mut rng);
            assert_eq!(chosen.as_str(), expected, "p2={} p3={}", p2, p3);
        }
    }

    #[test]
    fn test_empty_strategy_list_yields_default() {
        let players = ids();
        let ctx = DecisionContext {
            player: &players[0],
            strategies: &[],
            history: &[],
            players: &players,
            resolver: PayoffResolver::new(&[]),
            learning_rate: 0.1,
        };
        let mut state = ReplicatorState::uniform(0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for kind in PolicyKind::ALL {
            assert_eq!(choose_strategy(kind, &ctx, &mut state, &mut rng).as_str(), "Cooperate");
        }
    }

    #[test]
    fn test_replicator_dynamics_updates_state() {
        let table = GameAnalysis::prisoners_dilemma().payoff_matrix;
        let players = ids();
        let strategies = names(&["Cooperate", "Defect"]);
        let history = vec![round(1, "Cooperate", "Cooperate", 3.0, 3.0)];
        let ctx = DecisionContext {
            player: &players[0],
            strategies: &strategies,
            history: &history,
            players: &players,
            resolver: PayoffResolver::new(&table),
            learning_rate: 0.1,
        };
        let mut state = ReplicatorState::uniform(2);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        choose_strategy(PolicyKind::ReplicatorDynamics, &ctx, &mut state, &mut rng);

        // Hypothetical payoffs are 3 (Cooperate) and 5 (Defect)
        let p = state.probabilities();
        assert!((p[0] - 0.375).abs() < 1e-12);
        assert!((p[1] - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_every_policy_returns_a_legal_strategy() {
        let legal = names(&["Cooperate", "Defect"]);
        let history = vec![
            round(1, "Cooperate", "Defect", 0.0, 5.0),
            round(2, "Defect", "Defect", 1.0, 1.0),
        ];
        for kind in PolicyKind::ALL {
            for table in [GameAnalysis::prisoners_dilemma().payoff_matrix, Vec::new()] {
                for seed in 0..10 {
                    let chosen = decide(kind, &table, &history, seed);
                    assert!(legal.contains(&chosen), "{} chose {}", kind, chosen);
                }
            }
        }
    }
}
