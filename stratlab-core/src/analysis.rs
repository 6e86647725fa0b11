//! GameAnalysis - the scenario consumed by both engines

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, StrategyName};

/// Strategies given to any player whose list is empty
pub const DEFAULT_STRATEGIES: [&str; 2] = ["Cooperate", "Defect"];

/// Fallback strategy pair as owned names
pub fn default_strategies() -> Vec<StrategyName> {
    DEFAULT_STRATEGIES.iter().map(|&s| StrategyName::from(s)).collect()
}

/// A named participant and the actions available to it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub strategies: Vec<StrategyName>,
}

impl Player {
    pub fn new(id: &str, name: &str, strategies: &[&str]) -> Self {
        Self {
            id: PlayerId::from(id),
            name: name.to_string(),
            strategies: strategies.iter().map(|&s| StrategyName::from(s)).collect(),
        }
    }

    /// Strategy list with the default pair substituted when empty
    pub fn strategies_or_default(&self) -> Vec<StrategyName> {
        if self.strategies.is_empty() {
            default_strategies()
        } else {
            self.strategies.clone()
        }
    }

    /// Display name, falling back to the id
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

/// One joint outcome in a payoff table
///
/// Maps are ordered by player id, so "first player id" lookups are stable.
/// Either map may be missing entries; consumers must tolerate that.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PayoffCell {
    #[serde(default)]
    pub strategies: BTreeMap<PlayerId, StrategyName>,
    #[serde(default)]
    pub payoffs: BTreeMap<PlayerId, f64>,
}

impl PayoffCell {
    /// Build a cell from `(player, strategy, payoff)` triples
    pub fn from_entries(entries: &[(&str, &str, f64)]) -> Self {
        let mut cell = PayoffCell::default();
        for &(player, strategy, payoff) in entries {
            cell.strategies.insert(PlayerId::from(player), StrategyName::from(strategy));
            cell.payoffs.insert(PlayerId::from(player), payoff);
        }
        cell
    }

    pub fn strategy_of(&self, player: &PlayerId) -> Option<&StrategyName> {
        self.strategies.get(player)
    }

    pub fn payoff_of(&self, player: &PlayerId) -> Option<f64> {
        self.payoffs.get(player).copied().filter(|p| p.is_finite())
    }

    /// Mean of every finite payoff recorded in the cell
    pub fn mean_payoff(&self) -> Option<f64> {
        let values: Vec<f64> = self.payoffs.values().copied().filter(|p| p.is_finite()).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

/// Parsed strategic scenario. Read-only input to the engines.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameAnalysis {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "gameType")]
    pub game_type: Option<String>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default, alias = "payoffMatrix")]
    pub payoff_matrix: Vec<PayoffCell>,
    #[serde(default)]
    pub rules: Vec<String>,
}

impl GameAnalysis {
    pub fn new(players: Vec<Player>, payoff_matrix: Vec<PayoffCell>) -> Self {
        Self {
            players,
            payoff_matrix,
            ..Default::default()
        }
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    /// Union of all player strategies in first-seen order, or the default pair
    pub fn strategy_universe(&self) -> Vec<StrategyName> {
        let mut seen: Vec<StrategyName> = Vec::new();
        for player in &self.players {
            for strategy in &player.strategies {
                if !seen.contains(strategy) {
                    seen.push(strategy.clone());
                }
            }
        }
        if seen.is_empty() {
            default_strategies()
        } else {
            seen
        }
    }

    /// Display name for a player id, falling back to the id itself
    pub fn label_of<'a>(&'a self, id: &'a PlayerId) -> &'a str {
        self.players
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.label())
            .unwrap_or(id.as_str())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse from a JSON string (accepts both a bare analysis and `{"analysis": ...}`)
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct Wrapped {
            analysis: GameAnalysis,
        }

        if let Ok(wrapped) = serde_json::from_str::<Wrapped>(content) {
            return Ok(wrapped.analysis);
        }

        let analysis: GameAnalysis =
            serde_json::from_str(content).context("Scenario is not a valid game analysis")?;
        Ok(analysis)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Two-player prisoner's dilemma
    pub fn prisoners_dilemma() -> Self {
        let players = vec![
            Player::new("p1", "Alice", &["Cooperate", "Defect"]),
            Player::new("p2", "Bob", &["Cooperate", "Defect"]),
        ];
        let table = vec![
            PayoffCell::from_entries(&[("p1", "Cooperate", 3.0), ("p2", "Cooperate", 3.0)]),
            PayoffCell::from_entries(&[("p1", "Cooperate", 0.0), ("p2", "Defect", 5.0)]),
            PayoffCell::from_entries(&[("p1", "Defect", 5.0), ("p2", "Cooperate", 0.0)]),
            PayoffCell::from_entries(&[("p1", "Defect", 1.0), ("p2", "Defect", 1.0)]),
        ];
        Self {
            title: "Prisoner's Dilemma".to_string(),
            game_type: Some("simultaneous".to_string()),
            ..Self::new(players, table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_scenario() {
        let json = r#"{
            "title": "Pricing",
            "gameType": "simultaneous",
            "players": [
                {"id": "a", "name": "Firm A", "strategies": ["High", "Low"]},
                {"id": "b", "name": "Firm B"}
            ],
            "payoffMatrix": [
                {"strategies": {"a": "High", "b": "High"}, "payoffs": {"a": 4, "b": 4}},
                {"strategies": {"a": "Low"}}
            ]
        }"#;

        let analysis = GameAnalysis::from_json(json).unwrap();
        assert_eq!(analysis.players.len(), 2);
        assert_eq!(analysis.payoff_matrix.len(), 2);
        assert_eq!(analysis.game_type.as_deref(), Some("simultaneous"));
        assert!(analysis.players[1].strategies.is_empty());
        assert!(analysis.payoff_matrix[1].payoffs.is_empty());
    }

    #[test]
    fn test_parse_wrapped_scenario() {
        let json = r#"{"analysis": {"players": [{"id": "x"}]}}"#;
        let analysis = GameAnalysis::from_json(json).unwrap();
        assert_eq!(analysis.players[0].id, PlayerId::from("x"));
    }

    #[test]
    fn test_strategies_or_default() {
        let empty = Player::new("p", "", &[]);
        assert_eq!(empty.strategies_or_default(), default_strategies());
        assert_eq!(empty.label(), "p");
    }

    #[test]
    fn test_strategy_universe_preserves_first_seen_order() {
        let analysis = GameAnalysis::new(
            vec![
                Player::new("p1", "", &["Hawk", "Dove"]),
                Player::new("p2", "", &["Dove", "Bourgeois"]),
            ],
            vec![],
        );
        let universe = analysis.strategy_universe();
        let names: Vec<&str> = universe.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["Hawk", "Dove", "Bourgeois"]);
    }

    #[test]
    fn test_strategy_universe_defaults_when_empty() {
        let analysis = GameAnalysis::new(vec![Player::new("p1", "", &[])], vec![]);
        assert_eq!(analysis.strategy_universe(), default_strategies());
    }

    #[test]
    fn test_mean_payoff() {
        let cell = PayoffCell::from_entries(&[("p1", "A", 2.0), ("p2", "B", 4.0)]);
        assert_eq!(cell.mean_payoff(), Some(3.0));
        assert_eq!(PayoffCell::default().mean_payoff(), None);
    }
}
