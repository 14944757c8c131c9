//! Declarative operation-to-backend routing.
//!
//! The [`RoutingTable`] maps every facade [`Operation`] to the [`Backend`]
//! that serves it, so re-routing an operation is a data change rather than a
//! code change.
//!
//! # Default routes
//!
//! ```text
//! list_simulators            → local     (active identity only)
//! create_minimal_simulator   → remote
//! create_baseline_simulator  → embedded
//! list_snapshots             → remote
//! create_snapshot            → remote
//! load_snapshot              → remote
//! run                        → embedded
//! get_latest_log             → remote
//! get_logs                   → embedded  (re-runs an empty plan)
//! list_skills                → remote
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

/// Operations exposed by [`crate::SimulatorFacade`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    ListSimulators,
    CreateMinimalSimulator,
    CreateBaselineSimulator,
    ListSnapshots,
    CreateSnapshot,
    LoadSnapshot,
    Run,
    GetLatestLog,
    GetLogs,
    ListSkills,
}

/// Where an operation is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Backend {
    /// Answered from session state without leaving the process.
    Local,
    /// Forwarded to the remote HTTP service.
    Remote,
    /// Executed by the lazily loaded embedded runtime.
    Embedded,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteParseError {
    #[error("route `{0}` is not of the form operation=backend")]
    Malformed(String),

    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error("unknown backend `{0}`")]
    UnknownBackend(String),
}

/// Operation → backend mapping consulted on every facade call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingTable {
    routes: HashMap<Operation, Backend>,
}

impl RoutingTable {
    /// Table routing every operation to the same backend.
    pub fn uniform(backend: Backend) -> Self {
        Self {
            routes: Operation::iter().map(|op| (op, backend)).collect(),
        }
    }

    /// Table that sends everything to the remote service.
    pub fn remote_only() -> Self {
        Self::uniform(Backend::Remote)
    }

    /// Resolve the backend for an operation.
    pub fn backend(&self, operation: Operation) -> Backend {
        // Every constructor fills all operations; fall back to remote anyway.
        self.routes
            .get(&operation)
            .copied()
            .unwrap_or(Backend::Remote)
    }

    /// Builder-style override of a single route.
    pub fn route(mut self, operation: Operation, backend: Backend) -> Self {
        self.set(operation, backend);
        self
    }

    /// Override a single route, returning the previous backend.
    pub fn set(&mut self, operation: Operation, backend: Backend) -> Option<Backend> {
        self.routes.insert(operation, backend)
    }

    /// Operations currently routed to `backend`, in declaration order.
    pub fn operations_on(&self, backend: Backend) -> Vec<Operation> {
        Operation::iter()
            .filter(|op| self.backend(*op) == backend)
            .collect()
    }

    /// Whether any operation needs the embedded runtime.
    pub fn uses_embedded(&self) -> bool {
        !self.operations_on(Backend::Embedded).is_empty()
    }

    /// Apply overrides written as `operation=backend` pairs separated by
    /// commas, e.g. `list_simulators=remote,get_logs=remote`.
    ///
    /// Nothing is applied unless every pair parses.
    pub fn apply_overrides(&mut self, overrides: &str) -> Result<(), RouteParseError> {
        let mut parsed = Vec::new();

        for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (op, backend) = pair
                .split_once('=')
                .ok_or_else(|| RouteParseError::Malformed(pair.to_string()))?;
            let op = op.trim();
            let backend = backend.trim();

            let op = Operation::from_str(op)
                .map_err(|_| RouteParseError::UnknownOperation(op.to_string()))?;
            let backend = Backend::from_str(backend)
                .map_err(|_| RouteParseError::UnknownBackend(backend.to_string()))?;

            parsed.push((op, backend));
        }

        for (op, backend) in parsed {
            self.set(op, backend);
        }

        Ok(())
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        use Backend::*;
        use Operation::*;

        Self {
            routes: HashMap::from([
                (ListSimulators, Local),
                (CreateMinimalSimulator, Remote),
                (CreateBaselineSimulator, Embedded),
                (ListSnapshots, Remote),
                (CreateSnapshot, Remote),
                (LoadSnapshot, Remote),
                (Run, Embedded),
                (GetLatestLog, Remote),
                (GetLogs, Embedded),
                (ListSkills, Remote),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_operation() {
        let table = RoutingTable::default();
        assert_eq!(table.routes.len(), Operation::iter().count());
    }

    #[test]
    fn default_table_splits_backends() {
        let table = RoutingTable::default();

        assert_eq!(
            table.operations_on(Backend::Embedded),
            vec![
                Operation::CreateBaselineSimulator,
                Operation::Run,
                Operation::GetLogs
            ]
        );
        assert_eq!(
            table.operations_on(Backend::Local),
            vec![Operation::ListSimulators]
        );
        assert!(table.uses_embedded());
        assert!(!RoutingTable::remote_only().uses_embedded());
    }

    #[test]
    fn overrides_reroute_operations() {
        let mut table = RoutingTable::default();
        table
            .apply_overrides("list_simulators=remote, get_logs = remote")
            .unwrap();

        assert_eq!(table.backend(Operation::ListSimulators), Backend::Remote);
        assert_eq!(table.backend(Operation::GetLogs), Backend::Remote);
        assert_eq!(table.backend(Operation::Run), Backend::Embedded);
    }

    #[test]
    fn bad_override_leaves_table_untouched() {
        let mut table = RoutingTable::default();
        let err = table
            .apply_overrides("run=remote,get_logs=somewhere")
            .unwrap_err();

        assert_eq!(err, RouteParseError::UnknownBackend("somewhere".into()));
        assert_eq!(table, RoutingTable::default());
    }

    #[test]
    fn malformed_pair_is_rejected() {
        let mut table = RoutingTable::default();
        assert_eq!(
            table.apply_overrides("run"),
            Err(RouteParseError::Malformed("run".into()))
        );
        assert_eq!(
            table.apply_overrides("teleport=remote"),
            Err(RouteParseError::UnknownOperation("teleport".into()))
        );
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Operation::CreateBaselineSimulator.to_string(), "create_baseline_simulator");
        assert_eq!(Backend::Embedded.as_ref(), "embedded");
    }
}
