use serde::{Deserialize, Serialize};

use crate::SimulatorId;

/// Plan to execute against a simulator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub plan: String,
}

impl RunRequest {
    pub fn new(plan: impl Into<String>) -> Self {
        Self { plan: plan.into() }
    }
}

/// Request to persist a simulator's current state under a name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSnapshotCommand {
    pub name: String,
    pub simulator_id: SimulatorId,
}
