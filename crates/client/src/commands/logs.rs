use anyhow::Result;
use clap::Parser;
use simulator_core::SimulatorId;
use simulator_facade::SimulatorFacade;

use super::{parse_simulator_id, print_json};

/// Print a simulator's operation logs
#[derive(Parser)]
pub struct Logs {
    /// Simulator whose logs to print
    #[arg(value_parser = parse_simulator_id)]
    simulator_id: SimulatorId,

    /// Only print the most recent entry
    #[arg(long)]
    latest: bool,
}

impl Logs {
    pub async fn execute(self, facade: &SimulatorFacade) -> Result<()> {
        if self.latest {
            print_json(&facade.get_latest_log(&self.simulator_id).await?)
        } else {
            print_json(&facade.get_logs(&self.simulator_id).await?)
        }
    }
}
