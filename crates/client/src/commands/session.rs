//! Create, run and read back logs within one facade lifetime.
//!
//! The active simulator identity only lives as long as the facade, so this
//! is the one subcommand where embedded log retrieval can succeed.
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use simulator_core::{BaselineConfiguration, OperationLog, RunRequest};
use simulator_facade::SimulatorFacade;

use super::{print_json, read_json, read_plan};

/// Create a baseline simulator, run a plan and print its logs
#[derive(Parser)]
pub struct SessionDemo {
    /// JSON file holding the baseline configuration
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// File holding the plan text
    #[arg(value_name = "PLAN")]
    plan: PathBuf,
}

impl SessionDemo {
    pub async fn execute(self, facade: &SimulatorFacade) -> Result<()> {
        let configuration: BaselineConfiguration = read_json(&self.config)?;
        let plan = read_plan(&self.plan)?;
        print_json(&run_session(facade, &configuration, &plan).await?)
    }
}

pub async fn run_session(
    facade: &SimulatorFacade,
    configuration: &BaselineConfiguration,
    plan: &str,
) -> Result<Vec<OperationLog>> {
    let created = facade.create_baseline_simulator(configuration).await?;
    tracing::info!("Created simulator {}", created.id);

    let ran = facade.run(&created.id, &RunRequest::new(plan)).await?;
    tracing::info!("Plan produced {} log entries", ran.len());

    Ok(facade.get_logs(&created.id).await?)
}
