//! Stratlab Rounds - repeated-play simulation of named players
//!
//! This crate provides the round-based engine:
//! - Seven interchangeable strategy policies (plus a round-robin mix)
//! - Exploration noise and payoff accumulation per round
//! - Post-hoc convergence detection
//! - Insight synthesis over the round history
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_round_simulation (orchestration)
//! - Level 2: RoundSimulator::step, detect_convergence (phases)
//! - Level 3: choose_strategy and the individual policies (steps)
//! - Level 4: configuration, replicator distribution

mod config;
mod convergence;
mod insights;
mod policy;
mod replicator;
mod simulation;

pub use config::{PolicyKind, PolicyMode, SimulationConfig, UnknownPolicy};
pub use convergence::{detect_convergence, detect_convergence_with_window, Convergence, CONVERGENCE_WINDOW};
pub use insights::synthesize_round_insights;
pub use policy::{choose_strategy, DecisionContext};
pub use replicator::{ReplicatorState, PAYOFF_FLOOR};
pub use simulation::{
    run_round_simulation, run_round_simulation_seeded, PolicyAssignment, RoundSimulator,
    SimulationPhase, SimulationResult, SimulationRound,
};
