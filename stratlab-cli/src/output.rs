//! Shared output helpers for commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

/// Output flags shared by every command
#[derive(Args, Clone, Debug, Default)]
pub struct OutputArgs {
    /// Print the full result as JSON instead of a text summary
    #[arg(long)]
    pub json: bool,

    /// Also write the full JSON result to this file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Write `value` to the output file if one was requested, and to stdout for `--json`
pub fn emit<T: Serialize>(value: &T, args: &OutputArgs) -> Result<()> {
    if let Some(path) = &args.output {
        save_json(value, path)?;
    }

    if args.json {
        let content = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
        println!("{}", content);
    }

    Ok(())
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write result: {}", path.display()))?;
    tracing::info!("Saved result to {}", path.display());
    Ok(())
}
