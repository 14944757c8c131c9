//! Facade configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::embedded::{PackageSpec, PythonConfig};
use crate::routing::RoutingTable;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Everything needed to construct a [`crate::SimulatorFacade`] besides the
/// fetch implementation and the embedded runtime source.
#[derive(Clone, Debug)]
pub struct FacadeConfig {
    pub base_url: String,
    pub request_timeout: Option<Duration>,
    pub routes: RoutingTable,
    pub packages: Vec<PackageSpec>,
    pub python: PythonConfig,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            routes: RoutingTable::default(),
            packages: PackageSpec::default_plan(),
            python: PythonConfig::default(),
        }
    }
}

impl FacadeConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SIMULATOR_BASE_URL` - Remote service base URL (default: http://localhost:8000)
    /// - `SIMULATOR_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
    /// - `SIMULATOR_ROUTES` - Route overrides, e.g. `get_logs=remote,run=remote`
    /// - `SIMULATOR_PYTHON` - Interpreter for the embedded runtime (default: python3)
    /// - `SIMULATOR_BRIDGE_MODULE` - Module exposing the entry points (default: simaple.app.wasm)
    /// - `SIMULATOR_PACKAGE_INDEX` - Alternative package index URL (default: pip's)
    /// - `SIMULATOR_PYTHONPATH` - Extra import path for the bridge module (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base_url) = lookup("SIMULATOR_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }

        if let Some(secs) = parse::<u64>(lookup("SIMULATOR_REQUEST_TIMEOUT_SECS")) {
            config.request_timeout = Some(Duration::from_secs(secs.max(1)));
        }

        if let Some(routes) = lookup("SIMULATOR_ROUTES") {
            if let Err(e) = config.routes.apply_overrides(&routes) {
                tracing::warn!("Ignoring SIMULATOR_ROUTES: {}", e);
            }
        }

        if let Some(python) = lookup("SIMULATOR_PYTHON") {
            config.python.interpreter = PathBuf::from(python);
        }
        if let Some(module) = lookup("SIMULATOR_BRIDGE_MODULE") {
            config.python.bridge_module = module;
        }
        config.python.package_index = lookup("SIMULATOR_PACKAGE_INDEX");
        config.python.module_path = lookup("SIMULATOR_PYTHONPATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        config
    }
}

fn parse<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    value?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::routing::{Backend, Operation};

    fn from_pairs(pairs: &[(&str, &str)]) -> FacadeConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FacadeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = from_pairs(&[]);

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.routes, RoutingTable::default());
        assert_eq!(config.packages, PackageSpec::default_plan());
        assert_eq!(config.python, PythonConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = from_pairs(&[
            ("SIMULATOR_BASE_URL", "https://sim.example.com"),
            ("SIMULATOR_REQUEST_TIMEOUT_SECS", "30"),
            ("SIMULATOR_ROUTES", "list_simulators=remote"),
            ("SIMULATOR_PYTHON", "/opt/python/bin/python3"),
            ("SIMULATOR_PACKAGE_INDEX", "https://pypi.internal/simple"),
            ("SIMULATOR_PYTHONPATH", "/srv/simaple/src"),
        ]);

        assert_eq!(config.base_url, "https://sim.example.com");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.routes.backend(Operation::ListSimulators), Backend::Remote);
        assert_eq!(
            config.python.interpreter,
            PathBuf::from("/opt/python/bin/python3")
        );
        assert_eq!(
            config.python.package_index.as_deref(),
            Some("https://pypi.internal/simple")
        );
        assert_eq!(
            config.python.module_path,
            Some(PathBuf::from("/srv/simaple/src"))
        );
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = from_pairs(&[
            ("SIMULATOR_REQUEST_TIMEOUT_SECS", "soon"),
            ("SIMULATOR_ROUTES", "list_simulators=nowhere"),
            ("SIMULATOR_BASE_URL", "  "),
        ]);

        assert_eq!(config.request_timeout, None);
        assert_eq!(config.routes, RoutingTable::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
