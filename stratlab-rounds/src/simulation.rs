//! Round simulation - players choosing strategies over sequential rounds
//!
//! Level 1 - Orchestration and Level 2 - Phases
//!
//! Random draws are consumed in a fixed order so a seeded run is reproducible:
//! for each round, players in list order each make their policy draws followed
//! by one noise draw (plus one index draw if noise fires); payoff resolution then
//! draws any synthetic payoffs in player-id order.

use rand::Rng;
use serde::{Deserialize, Serialize};
use stratlab_core::{
    uniform_index, GameAnalysis, PayoffMap, PayoffResolver, PlayerId, StrategyName,
    StrategyProfile,
};

use crate::config::{PolicyKind, SimulationConfig};
use crate::convergence::{detect_convergence, Convergence};
use crate::insights::synthesize_round_insights;
use crate::policy::{choose_strategy, DecisionContext};
use crate::replicator::ReplicatorState;

/// One completed round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRound {
    /// 1-based round number
    pub round: usize,
    /// Strategy each player ended up playing
    pub choices: StrategyProfile,
    /// Payoff each player received this round
    pub payoffs: PayoffMap,
    /// Running total per player, including this round
    pub cumulative: PayoffMap,
    /// Players whose policy choice was replaced by noise
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub perturbed: Vec<PlayerId>,
}

/// Policy a player ran for the whole simulation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAssignment {
    pub player: PlayerId,
    pub policy: PolicyKind,
}

/// Outcome of a round simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Every round, in order
    pub rounds: Vec<SimulationRound>,
    /// Post-hoc convergence verdict
    pub convergence: Convergence,
    /// Human-readable observations
    pub insights: Vec<String>,
    /// Policy assigned to each player, in player-list order
    pub assignments: Vec<PolicyAssignment>,
    /// Configuration the run used
    pub config: SimulationConfig,
}

impl SimulationResult {
    pub fn final_round(&self) -> Option<&SimulationRound> {
        self.rounds.last()
    }

    /// Players by final cumulative payoff, highest first (ties keep id order)
    pub fn standings(&self) -> Vec<(PlayerId, f64)> {
        let mut standings: Vec<(PlayerId, f64)> = self
            .final_round()
            .map(|r| r.cumulative.iter().map(|(p, v)| (p.clone(), *v)).collect())
            .unwrap_or_default();
        standings.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        standings
    }

    /// How often each strategy was played across all players and rounds
    ///
    /// Sorted by count descending; ties keep first-played order.
    pub fn strategy_frequencies(&self) -> Vec<(StrategyName, usize)> {
        let mut counts: Vec<(StrategyName, usize)> = Vec::new();
        for round in &self.rounds {
            for strategy in round.choices.values() {
                match counts.iter_mut().find(|(name, _)| name == strategy) {
                    Some((_, count)) => *count += 1,
                    None => counts.push((strategy.clone(), 1)),
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Number of individual choices overridden by noise
    pub fn perturbation_count(&self) -> usize {
        self.rounds.iter().map(|r| r.perturbed.len()).sum()
    }
}

/// Lifecycle of a simulator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    Initializing,
    Running,
    Complete,
}

/// Drives players through the configured number of rounds
///
/// Owns every piece of mutable run state, including the replicator
/// distributions, so nothing survives past `finish`.
pub struct RoundSimulator<'a> {
    analysis: &'a GameAnalysis,
    config: &'a SimulationConfig,
    player_ids: Vec<PlayerId>,
    strategies: Vec<Vec<StrategyName>>,
    policies: Vec<PolicyKind>,
    replicators: Vec<ReplicatorState>,
    rounds: Vec<SimulationRound>,
    phase: SimulationPhase,
}

impl<'a> RoundSimulator<'a> {
    /// Prepare a run: fill empty strategy lists, assign policies, reset distributions
    pub fn new(analysis: &'a GameAnalysis, config: &'a SimulationConfig) -> Self {
        let mut simulator = Self {
            analysis,
            config,
            player_ids: Vec::new(),
            strategies: Vec::new(),
            policies: Vec::new(),
            replicators: Vec::new(),
            rounds: Vec::with_capacity(config.rounds),
            phase: SimulationPhase::Initializing,
        };

        for (index, player) in analysis.players.iter().enumerate() {
            let strategies = player.strategies_or_default();
            simulator.replicators.push(ReplicatorState::uniform(strategies.len()));
            simulator.strategies.push(strategies);
            simulator.policies.push(config.policy.policy_for(index));
            simulator.player_ids.push(player.id.clone());
        }

        simulator.phase = if config.rounds == 0 {
            SimulationPhase::Complete
        } else {
            SimulationPhase::Running
        };
        simulator
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn rounds(&self) -> &[SimulationRound] {
        &self.rounds
    }

    pub fn assignments(&self) -> Vec<PolicyAssignment> {
        self.player_ids
            .iter()
            .zip(&self.policies)
            .map(|(player, &policy)| PolicyAssignment {
                player: player.clone(),
                policy,
            })
            .collect()
    }

    /// Play one round. Returns `None` once all rounds are done.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Option<&SimulationRound> {
        if self.phase != SimulationPhase::Running {
            return None;
        }

        let (choices, perturbed) = self.choose_all(rng);
        let analysis = self.analysis;
        let resolver = PayoffResolver::new(&analysis.payoff_matrix);
        let payoffs = resolver.resolve_profile(&choices, rng);
        let cumulative = self.accumulate(&payoffs);

        let round = SimulationRound {
            round: self.rounds.len() + 1,
            choices,
            payoffs,
            cumulative,
            perturbed,
        };
        tracing::debug!(round = round.round, perturbed = round.perturbed.len(), "round complete");
        self.rounds.push(round);

        if self.rounds.len() >= self.config.rounds {
            self.phase = SimulationPhase::Complete;
        }
        self.rounds.last()
    }

    /// Play every remaining round and build the result
    pub fn run<R: Rng>(mut self, rng: &mut R) -> SimulationResult {
        while self.step(rng).is_some() {}
        self.finish()
    }

    /// Analyze the rounds played so far
    pub fn finish(self) -> SimulationResult {
        let convergence = detect_convergence(&self.rounds);
        let assignments = self.assignments();
        let insights = synthesize_round_insights(
            self.analysis,
            self.config,
            &self.rounds,
            &convergence,
            &assignments,
        );

        tracing::info!(
            rounds = self.rounds.len(),
            converged = convergence.converged,
            equilibrium_round = ?convergence.equilibrium_round,
            "round simulation finished"
        );

        SimulationResult {
            rounds: self.rounds,
            convergence,
            insights,
            assignments,
            config: self.config.clone(),
        }
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    /// Every player's choice for the round in progress, after noise
    fn choose_all<R: Rng>(&mut self, rng: &mut R) -> (StrategyProfile, Vec<PlayerId>) {
        let mut choices = StrategyProfile::new();
        let mut perturbed = Vec::new();
        let analysis = self.analysis;
        let resolver = PayoffResolver::new(&analysis.payoff_matrix);

        for i in 0..self.player_ids.len() {
            let ctx = DecisionContext {
                player: &self.player_ids[i],
                strategies: &self.strategies[i],
                history: &self.rounds,
                players: &self.player_ids,
                resolver,
                learning_rate: self.config.learning_rate,
            };
            let mut choice = choose_strategy(self.policies[i], &ctx, &mut self.replicators[i], rng);

            if rng.gen::<f64>() < self.config.noise {
                let legal = &self.strategies[i];
                choice = legal[uniform_index(legal.len(), rng)].clone();
                perturbed.push(self.player_ids[i].clone());
            }

            choices.insert(self.player_ids[i].clone(), choice);
        }

        (choices, perturbed)
    }

    /// Add this round's payoffs onto the previous running totals
    fn accumulate(&self, payoffs: &PayoffMap) -> PayoffMap {
        let previous = self.rounds.last().map(|r| &r.cumulative);
        payoffs
            .iter()
            .map(|(player, payoff)| {
                let before = previous.and_then(|c| c.get(player)).copied().unwrap_or(0.0);
                (player.clone(), before + payoff)
            })
            .collect()
    }
}

/// Run a full round simulation
///
/// `config` is assumed valid (see [`SimulationConfig::validate`]). The analysis is
/// only read.
pub fn run_round_simulation<R: Rng>(
    analysis: &GameAnalysis,
    config: &SimulationConfig,
    rng: &mut R,
) -> SimulationResult {
    tracing::info!(
        players = analysis.players.len(),
        rounds = config.rounds,
        policy = %config.policy,
        "starting round simulation"
    );
    RoundSimulator::new(analysis, config).run(rng)
}

/// Run a round simulation on a fresh `ChaCha8Rng` seeded with `seed`
pub fn run_round_simulation_seeded(
    analysis: &GameAnalysis,
    config: &SimulationConfig,
    seed: u64,
) -> SimulationResult {
    let mut rng = stratlab_core::create_rng(Some(seed));
    run_round_simulation(analysis, config, &mut rng)
}
