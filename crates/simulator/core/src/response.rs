use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::SimulatorId;

/// Identity of a created simulator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorResponse {
    pub id: SimulatorId,
}

impl SimulatorResponse {
    pub fn new(id: impl Into<SimulatorId>) -> Self {
        Self { id: id.into() }
    }
}

/// A named, persisted simulator state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulator_id: Option<SimulatorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Skill metadata published by the remote service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
