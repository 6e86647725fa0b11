//! Identifier newtypes
//!
//! Player ids and strategy names are both strings on the wire, but they live in
//! different domains: payoff cells are keyed by player id and carry strategy names
//! as values. Keeping them as distinct types stops one from being looked up where
//! the other is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a player within a scenario
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Name of an action a player can take
///
/// Equality through `==` is exact. Payoff-table matching is case-insensitive and
/// goes through [`StrategyName::matches`] instead.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyName(String);

impl StrategyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison used by every table lookup
    pub fn matches(&self, other: &StrategyName) -> bool {
        self.0 == other.0 || self.0.to_lowercase() == other.0.to_lowercase()
    }

    /// Lowercased form, for use as a hash key when counting
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StrategyName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Position of `name` in `strategies`, compared case-insensitively
pub fn position_of(strategies: &[StrategyName], name: &StrategyName) -> Option<usize> {
    strategies.iter().position(|s| s.matches(name))
}
