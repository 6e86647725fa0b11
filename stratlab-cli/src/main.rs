//! Stratlab CLI - Command-line interface
//!
//! Commands:
//! - rounds: Simulate named players over repeated rounds
//! - population: Evolve strategy frequencies across generations
//! - sweep: Run many seeded round simulations in parallel

mod output;
mod population;
mod rounds;
mod sweep;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stratlab")]
#[command(about = "Game-theoretic simulation of strategic scenarios")]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate players choosing strategies round by round
    Rounds(rounds::RoundsArgs),
    /// Evolve a population of strategies
    Population(population::PopulationArgs),
    /// Run many independently seeded round simulations
    Sweep(sweep::SweepArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rounds(args) => rounds::run(args, cli.seed),
        Commands::Population(args) => population::run(args, cli.seed),
        Commands::Sweep(args) => sweep::run(args, cli.seed),
    }
}

/// Install the tracing subscriber (RUST_LOG wins over --verbose)
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
