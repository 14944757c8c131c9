use anyhow::Result;
use clap::Subcommand;
use simulator_core::{CreateSnapshotCommand, SimulatorId};
use simulator_facade::SimulatorFacade;

use super::{parse_simulator_id, print_json};

#[derive(Subcommand)]
pub enum SnapshotsCommand {
    /// List saved snapshots
    List,

    /// Save a simulator's current state under a name
    Create {
        /// Snapshot name
        name: String,

        /// Simulator to snapshot
        #[arg(value_parser = parse_simulator_id)]
        simulator_id: SimulatorId,
    },

    /// Restore a snapshot into a fresh simulator
    Load {
        /// Snapshot to restore
        snapshot_id: String,
    },
}

impl SnapshotsCommand {
    pub async fn execute(self, facade: &SimulatorFacade) -> Result<()> {
        match self {
            SnapshotsCommand::List => print_json(&facade.list_snapshots().await?),
            SnapshotsCommand::Create { name, simulator_id } => {
                let request = CreateSnapshotCommand { name, simulator_id };
                print_json(&facade.create_snapshot(&request).await?)
            }
            SnapshotsCommand::Load { snapshot_id } => {
                print_json(&facade.load_snapshot(&snapshot_id).await?)
            }
        }
    }
}
