use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one live simulator instance.
///
/// The remote service hands out string identifiers while the embedded
/// runtime returns integers, so both shapes are accepted as-is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimulatorId {
    Int(i64),
    Text(String),
}

impl SimulatorId {
    /// Returns the identifier as a URL path segment.
    pub fn as_path_segment(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SimulatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorId::Int(value) => write!(f, "{}", value),
            SimulatorId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for SimulatorId {
    fn from(value: i64) -> Self {
        SimulatorId::Int(value)
    }
}

impl From<&str> for SimulatorId {
    fn from(value: &str) -> Self {
        SimulatorId::Text(value.to_string())
    }
}

impl From<String> for SimulatorId {
    fn from(value: String) -> Self {
        SimulatorId::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_both_identifier_shapes() {
        let int: SimulatorId = serde_json::from_str("7").unwrap();
        let text: SimulatorId = serde_json::from_str("\"sim-1\"").unwrap();

        assert_eq!(int, SimulatorId::Int(7));
        assert_eq!(text, SimulatorId::from("sim-1"));
    }

    #[test]
    fn displays_raw_value_for_paths() {
        assert_eq!(SimulatorId::Int(42).as_path_segment(), "42");
        assert_eq!(
            SimulatorId::from("0b5c-uuid").as_path_segment(),
            "0b5c-uuid"
        );
    }

    #[test]
    fn serializes_without_tag() {
        let json = serde_json::to_string(&SimulatorId::Int(3)).unwrap();
        assert_eq!(json, "3");
    }
}
