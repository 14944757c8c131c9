//! Initial simulator parameters supplied by callers.
//!
//! Configurations are immutable from the facade's point of view: they are
//! borrowed, serialized, and forwarded, never modified.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hand-assembled simulator configuration accepted by the remote service.
///
/// Stat blocks are kept as opaque JSON because their schema belongs to the
/// simulator, not to this client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinimalSimulatorConfiguration {
    pub action_stat: Value,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub injected_values: BTreeMap<String, Value>,
    #[serde(default)]
    pub skill_levels: BTreeMap<String, i64>,
    #[serde(default)]
    pub v_improvements: BTreeMap<String, i64>,
    pub character_stat: Value,
}

/// Baseline character description used to derive a full simulation
/// environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineConfiguration {
    pub tier: String,
    pub jobtype: String,
    pub job_category: i32,
    pub level: u32,
    #[serde(default)]
    pub artifact_level: u32,
    #[serde(default)]
    pub passive_skill_level: u32,
    #[serde(default)]
    pub combat_orders_level: u32,
}
