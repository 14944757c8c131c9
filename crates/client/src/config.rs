//! Client configuration loaded from the environment.
use std::env;

use simulator_facade::FacadeConfig;

/// Settings for one invocation of the command-line client.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub facade: FacadeConfig,
    pub log_file: bool,
    pub session_id: Option<String>,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// On top of the variables read by [`FacadeConfig::from_env`]:
    /// - `SIMULATOR_LOG_FILE` - Also write logs to a per-session file (default: false)
    /// - `SIMULATOR_SESSION_ID` - Session identifier for the log file (default: auto-generated)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            facade: FacadeConfig::from_lookup(&lookup),
            log_file: lookup("SIMULATOR_LOG_FILE")
                .as_deref()
                .and_then(parse_bool)
                .unwrap_or(false),
            session_id: lookup("SIMULATOR_SESSION_ID").filter(|id| !id.trim().is_empty()),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
