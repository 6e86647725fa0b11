//! Convergence detection over a finished round sequence

use serde::{Deserialize, Serialize};
use stratlab_core::StrategyProfile;

use crate::simulation::SimulationRound;

/// Consecutive identical rounds required to call a profile stable
pub const CONVERGENCE_WINDOW: usize = 10;

/// Convergence verdict
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub converged: bool,
    /// Round number at the start of the first stable window
    pub equilibrium_round: Option<usize>,
    /// The stable profile, or the final round's profile when not converged
    pub profile: StrategyProfile,
}

/// Find the first 10-round window where every player repeats the same strategy
pub fn detect_convergence(rounds: &[SimulationRound]) -> Convergence {
    detect_convergence_with_window(rounds, CONVERGENCE_WINDOW)
}

/// Same as [`detect_convergence`] with a custom window length (minimum 1)
pub fn detect_convergence_with_window(rounds: &[SimulationRound], window: usize) -> Convergence {
    let window = window.max(1);

    if rounds.len() >= window {
        for start in 0..=rounds.len() - window {
            let anchor = &rounds[start].choices;
            if rounds[start + 1..start + window].iter().all(|r| &r.choices == anchor) {
                return Convergence {
                    converged: true,
                    equilibrium_round: Some(rounds[start].round),
                    profile: anchor.clone(),
                };
            }
        }
    }

    Convergence {
        converged: false,
        equilibrium_round: None,
        profile: rounds.last().map(|r| r.choices.clone()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratlab_core::{PayoffMap, PlayerId, StrategyName};

    fn round(index: usize, p1: &str, p2: &str) -> SimulationRound {
        let choices: StrategyProfile = [
            (PlayerId::from("p1"), StrategyName::from(p1)),
            (PlayerId::from("p2"), StrategyName::from(p2)),
        ]
        .into_iter()
        .collect();
        SimulationRound {
            round: index,
            choices,
            payoffs: PayoffMap::new(),
            cumulative: PayoffMap::new(),
            perturbed: Vec::new(),
        }
    }

    #[test]
    fn test_detects_first_stable_window() {
        let mut rounds: Vec<SimulationRound> = (1..=4).map(|i| round(i, "C", if i % 2 == 0 { "C" } else { "D" })).collect();
        rounds.extend((5..=20).map(|i| round(i, "D", "D")));

        let verdict = detect_convergence(&rounds);
        assert!(verdict.converged);
        assert_eq!(verdict.equilibrium_round, Some(5));
        assert_eq!(verdict.profile[&PlayerId::from("p1")].as_str(), "D");
    }

    #[test]
    fn test_too_few_rounds() {
        let rounds: Vec<SimulationRound> = (1..=9).map(|i| round(i, "C", "C")).collect();
        let verdict = detect_convergence(&rounds);
        assert!(!verdict.converged);
        assert_eq!(verdict.equilibrium_round, None);
        assert_eq!(verdict.profile, rounds[8].choices);
    }

    #[test]
    fn test_exactly_one_window() {
        let rounds: Vec<SimulationRound> = (1..=10).map(|i| round(i, "C", "C")).collect();
        assert_eq!(detect_convergence(&rounds).equilibrium_round, Some(1));
    }

    #[test]
    fn test_interrupted_window_does_not_count() {
        let rounds: Vec<SimulationRound> = (1..=15)
            .map(|i| if i == 8 { round(i, "C", "D") } else { round(i, "C", "C") })
            .collect();
        let verdict = detect_convergence(&rounds);
        assert!(!verdict.converged);
        assert_eq!(verdict.profile, rounds[14].choices);
    }

    #[test]
    fn test_empty_rounds() {
        let verdict = detect_convergence(&[]);
        assert!(!verdict.converged);
        assert!(verdict.profile.is_empty());
    }

    #[test]
    fn test_custom_window() {
        let rounds: Vec<SimulationRound> = (1..=3).map(|i| round(i, "C", "C")).collect();
        assert!(detect_convergence_with_window(&rounds, 3).converged);
        assert!(detect_convergence_with_window(&rounds, 0).converged);
    }
}
