use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use simulator_core::{BaselineConfiguration, MinimalSimulatorConfiguration};
use simulator_facade::SimulatorFacade;

use super::{print_json, read_json};

#[derive(Subcommand)]
pub enum SimulatorsCommand {
    /// List known simulators
    List,

    /// Create a simulator from a full configuration file
    CreateMinimal {
        /// JSON file holding the configuration
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },

    /// Create a simulator from a baseline character description
    CreateBaseline {
        /// JSON file holding the baseline configuration
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },
}

impl SimulatorsCommand {
    pub async fn execute(self, facade: &SimulatorFacade) -> Result<()> {
        match self {
            SimulatorsCommand::List => print_json(&facade.list_simulators().await?),
            SimulatorsCommand::CreateMinimal { config } => {
                let configuration: MinimalSimulatorConfiguration = read_json(&config)?;
                print_json(&facade.create_minimal_simulator(&configuration).await?)
            }
            SimulatorsCommand::CreateBaseline { config } => {
                let configuration: BaselineConfiguration = read_json(&config)?;
                print_json(&facade.create_baseline_simulator(&configuration).await?)
            }
        }
    }
}
