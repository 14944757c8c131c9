//! Operation log records produced by simulator runs.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the ordered log produced by running a plan.
///
/// The embedded runtime and the remote service emit slightly different
/// shapes; fields this client does not know about are kept in `extra` so
/// nothing is lost when the record is handed on to a renderer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationLog {
    #[serde(default)]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    /// Per-step play logs, opaque to the facade.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
