//! Payoff resolution against a sparse payoff table
//!
//! Two lookups are supported:
//! - full profile: one strategy per player id (round simulation)
//! - pairwise: two strategy names with no player identity (population matchups)
//!
//! Both always return finite payoffs. When the table is empty or nothing
//! matches, payoffs are synthesized uniformly from [2, 6).

use std::collections::BTreeMap;
use std::ops::Range;

use rand::Rng;

use crate::analysis::PayoffCell;
use crate::ids::{PlayerId, StrategyName};

/// Range for payoffs invented when no cell matches
pub const SYNTHETIC_PAYOFF: Range<f64> = 2.0..6.0;

/// Range for a single player missing from an otherwise matching cell
pub const MISSING_ENTRY_PAYOFF: Range<f64> = 4.0..6.0;

/// Strategy chosen by each player
pub type StrategyProfile = BTreeMap<PlayerId, StrategyName>;

/// Payoff received by each player
pub type PayoffMap = BTreeMap<PlayerId, f64>;

/// Read-only view over a payoff table
#[derive(Clone, Copy, Debug)]
pub struct PayoffResolver<'a> {
    table: &'a [PayoffCell],
}

impl<'a> PayoffResolver<'a> {
    pub fn new(table: &'a [PayoffCell]) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a [PayoffCell] {
        self.table
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Resolve payoffs for a complete strategy profile
    ///
    /// Synthetic draws happen in player-id order.
    pub fn resolve_profile<R: Rng>(&self, profile: &StrategyProfile, rng: &mut R) -> PayoffMap {
        match self.best_profile_cell(profile) {
            Some(cell) => profile
                .keys()
                .map(|player| {
                    let payoff = cell
                        .payoff_of(player)
                        .unwrap_or_else(|| rng.gen_range(MISSING_ENTRY_PAYOFF));
                    (player.clone(), payoff)
                })
                .collect(),
            None => {
                tracing::trace!("no cell matches profile, synthesizing payoffs");
                profile
                    .keys()
                    .map(|player| (player.clone(), rng.gen_range(SYNTHETIC_PAYOFF)))
                    .collect()
            }
        }
    }

    /// Payoff one player would receive under `profile`
    pub fn payoff_for<R: Rng>(
        &self,
        player: &PlayerId,
        profile: &StrategyProfile,
        rng: &mut R,
    ) -> f64 {
        self.resolve_profile(profile, rng)
            .get(player)
            .copied()
            .unwrap_or_else(|| rng.gen_range(SYNTHETIC_PAYOFF))
    }

    /// Cell agreeing with the most players' choices; first in table order wins ties
    pub fn best_profile_cell(&self, profile: &StrategyProfile) -> Option<&'a PayoffCell> {
        let mut best: Option<&'a PayoffCell> = None;
        let mut best_score = 0;

        for cell in self.table {
            let score = profile
                .iter()
                .filter(|(player, chosen)| {
                    cell.strategy_of(player).map_or(false, |recorded| recorded.matches(chosen))
                })
                .count();
            if score > best_score {
                best_score = score;
                best = Some(cell);
            }
        }

        best
    }

    /// Resolve a single matchup between strategies `a` and `b`
    ///
    /// Returns `(payoff to a, payoff to b)`.
    pub fn resolve_pair<R: Rng>(
        &self,
        a: &StrategyName,
        b: &StrategyName,
        rng: &mut R,
    ) -> (f64, f64) {
        let Some(cell) = self.best_pair_cell(a, b) else {
            tracing::trace!("no cell matches {} vs {}, synthesizing payoffs", a, b);
            return (rng.gen_range(SYNTHETIC_PAYOFF), rng.gen_range(SYNTHETIC_PAYOFF));
        };

        if !a.matches(b) {
            if let Some(directional) = directional_payoffs(cell, a, b) {
                return directional;
            }
        }

        match cell.mean_payoff() {
            Some(mean) => (mean, mean),
            None => (rng.gen_range(SYNTHETIC_PAYOFF), rng.gen_range(SYNTHETIC_PAYOFF)),
        }
    }

    /// Best cell for a strategy pair; `None` when nothing scores above zero
    pub fn best_pair_cell(&self, a: &StrategyName, b: &StrategyName) -> Option<&'a PayoffCell> {
        let mut best: Option<&'a PayoffCell> = None;
        let mut best_score = 0;

        for cell in self.table {
            let score = pair_score(cell, a, b);
            if score > best_score {
                best_score = score;
                best = Some(cell);
            }
        }

        best
    }
}

/// Score a cell against a strategy pair
///
/// Mirror matchups count every slot playing the strategy. Mixed matchups score
/// one point per side present anywhere in the cell.
fn pair_score(cell: &PayoffCell, a: &StrategyName, b: &StrategyName) -> usize {
    if a.matches(b) {
        cell.strategies.values().filter(|s| s.matches(a)).count()
    } else {
        let has_a = cell.strategies.values().any(|s| s.matches(a));
        let has_b = cell.strategies.values().any(|s| s.matches(b));
        usize::from(has_a) + usize::from(has_b)
    }
}

/// Payoffs read from the slots playing `a` and `b`, if both resolve
fn directional_payoffs(cell: &PayoffCell, a: &StrategyName, b: &StrategyName) -> Option<(f64, f64)> {
    let (slot_a, _) = cell.strategies.iter().find(|(_, s)| s.matches(a))?;
    let (slot_b, _) = cell
        .strategies
        .iter()
        .find(|(player, s)| *player != slot_a && s.matches(b))?;

    Some((cell.payoff_of(slot_a)?, cell.payoff_of(slot_b)?))
}
