use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use simulator_core::{RunRequest, SimulatorId};
use simulator_facade::SimulatorFacade;

use super::{parse_simulator_id, print_json, read_plan};

/// Run a plan against a simulator
#[derive(Parser)]
pub struct Run {
    /// Simulator to run against
    #[arg(value_parser = parse_simulator_id)]
    simulator_id: SimulatorId,

    /// File holding the plan text
    #[arg(value_name = "PLAN")]
    plan: PathBuf,
}

impl Run {
    pub async fn execute(self, facade: &SimulatorFacade) -> Result<()> {
        let request = RunRequest::new(read_plan(&self.plan)?);
        let logs = facade.run(&self.simulator_id, &request).await?;
        tracing::info!("Run produced {} log entries", logs.len());
        print_json(&logs)
    }
}
