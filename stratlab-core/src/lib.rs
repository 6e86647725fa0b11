//! Stratlab Core - scenario model and payoff resolution
//!
//! This crate provides the pieces shared by both simulation engines:
//! - Typed identifiers for players and strategies
//! - The `GameAnalysis` scenario model (players, payoff table, metadata)
//! - Payoff resolution by full profile and by strategy pair
//! - Configuration validation errors
//! - Seeded random sources and sampling helpers

pub mod analysis;
pub mod error;
pub mod ids;
pub mod payoff;
pub mod rng;

// Re-exports for convenient access
pub use analysis::{default_strategies, GameAnalysis, PayoffCell, Player, DEFAULT_STRATEGIES};
pub use error::ConfigError;
pub use ids::{position_of, PlayerId, StrategyName};
pub use payoff::{PayoffMap, PayoffResolver, StrategyProfile, SYNTHETIC_PAYOFF};
pub use rng::{create_rng, sample_weighted, uniform_index};
