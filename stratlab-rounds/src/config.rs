//! Configuration types for round simulation
//!
//! Level 4 - Utilities and configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stratlab_core::error::{require_positive, require_unit};
use stratlab_core::ConfigError;

/// Decision rule a player follows each round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Uniform over legal strategies
    Random,
    /// Best reply to everyone repeating last round
    Greedy,
    /// Mirror the opponents' most common last move
    TitForTat,
    /// Reinforcement on accumulated payoff
    Adaptive,
    /// Table average first, then greedy
    BestResponse,
    /// Expected payoff against empirical opponent frequencies
    FictitiousPlay,
    /// Multiplicative update of a persistent mixed strategy
    ReplicatorDynamics,
}

impl PolicyKind {
    /// Fixed order used for round-robin assignment in mixed mode
    pub const ALL: [PolicyKind; 7] = [
        PolicyKind::Random,
        PolicyKind::Greedy,
        PolicyKind::TitForTat,
        PolicyKind::Adaptive,
        PolicyKind::BestResponse,
        PolicyKind::FictitiousPlay,
        PolicyKind::ReplicatorDynamics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Random => "random",
            PolicyKind::Greedy => "greedy",
            PolicyKind::TitForTat => "tit-for-tat",
            PolicyKind::Adaptive => "adaptive",
            PolicyKind::BestResponse => "best-response",
            PolicyKind::FictitiousPlay => "fictitious-play",
            PolicyKind::ReplicatorDynamics => "replicator-dynamics",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized policy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown policy '{0}' (expected one of: random, greedy, tit-for-tat, adaptive, best-response, fictitious-play, replicator-dynamics, mixed)")]
pub struct UnknownPolicy(pub String);

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        PolicyKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| UnknownPolicy(s.to_string()))
    }
}

/// Policy selection for a whole run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyMode {
    /// Every player runs the same policy
    Uniform(PolicyKind),
    /// Player `i` runs `PolicyKind::ALL[i % 7]`
    Mixed,
}

impl PolicyMode {
    /// Policy for the player at `index` in the player list
    pub fn policy_for(self, index: usize) -> PolicyKind {
        match self {
            PolicyMode::Uniform(kind) => kind,
            PolicyMode::Mixed => PolicyKind::ALL[index % PolicyKind::ALL.len()],
        }
    }
}

impl Default for PolicyMode {
    fn default() -> Self {
        PolicyMode::Mixed
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyMode::Uniform(kind) => kind.fmt(f),
            PolicyMode::Mixed => f.write_str("mixed"),
        }
    }
}

impl FromStr for PolicyMode {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("mixed") {
            Ok(PolicyMode::Mixed)
        } else {
            s.parse().map(PolicyMode::Uniform)
        }
    }
}

/// Round simulation configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of rounds to play
    pub rounds: usize,
    /// Chance of replacing each choice with a uniformly random one
    pub noise: f64,
    /// Reinforcement step for the adaptive policy
    pub learning_rate: f64,
    /// Which policy (or mix) players follow
    pub policy: PolicyMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: 50,
            noise: 0.05,
            learning_rate: 0.1,
            policy: PolicyMode::Mixed,
        }
    }
}

impl SimulationConfig {
    /// Create a validated config
    pub fn new(
        rounds: usize,
        noise: f64,
        learning_rate: f64,
        policy: PolicyMode,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            rounds,
            noise,
            learning_rate,
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check counts and probabilities before a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("rounds", self.rounds)?;
        require_unit("noise", self.noise)?;
        require_unit("learning_rate", self.learning_rate)?;
        Ok(())
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_policy(mut self, policy: PolicyMode) -> Self {
        self.policy = policy;
        self
    }
}
