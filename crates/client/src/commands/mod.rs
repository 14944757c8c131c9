//! Subcommand implementations.
//!
//! Each subcommand owns its clap arguments and an async `execute` that
//! drives the facade and prints the result as pretty JSON on stdout.
mod logs;
mod run;
mod session;
mod simulators;
mod snapshots;

use std::convert::Infallible;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use simulator_core::SimulatorId;

pub use logs::Logs;
pub use run::Run;
pub use session::SessionDemo;
pub use simulators::SimulatorsCommand;
pub use snapshots::SnapshotsCommand;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

/// Read a JSON payload such as a simulator configuration.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub fn read_plan(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read plan {}", path.display()))
}

/// Numeric arguments become integer identities, anything else stays text.
pub fn parse_simulator_id(raw: &str) -> Result<SimulatorId, Infallible> {
    Ok(raw
        .trim()
        .parse::<i64>()
        .map(SimulatorId::Int)
        .unwrap_or_else(|_| SimulatorId::from(raw.trim())))
}
