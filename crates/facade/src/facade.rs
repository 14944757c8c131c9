//! Backend-agnostic simulator operations.
//!
//! [`SimulatorFacade`] exposes one operation set to the UI layer. Each call
//! consults the [`RoutingTable`] and is served locally from the session, by
//! the remote service through [`Transport`], or by the embedded runtime
//! (initialized on first use).
use std::sync::Arc;

use thiserror::Error;

use simulator_core::{
    BaselineConfiguration, CreateSnapshotCommand, MinimalSimulatorConfiguration, OperationLog,
    RunRequest, SimulatorId, SimulatorResponse, Skill, SnapshotResponse,
};

use crate::config::FacadeConfig;
use crate::embedded::{EmbeddedRuntimeLoader, PackageSpec, RuntimeSource};
use crate::error::{FacadeError, Result};
use crate::routing::{Backend, Operation, RoutingTable};
use crate::session::Session;
use crate::transport::{HttpFetch, Transport};

/// Client-facing simulator facade.
///
/// One facade is one session: the embedded runtime is loaded at most once
/// per facade, and the active simulator identity lives here rather than in
/// process-wide state.
pub struct SimulatorFacade {
    transport: Transport,
    session: Session,
    routes: RoutingTable,
}

impl SimulatorFacade {
    /// Create a new facade builder.
    pub fn builder() -> FacadeBuilder {
        FacadeBuilder::new()
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Eagerly bring up the embedded runtime.
    ///
    /// Embedded-routed operations do this on their own; calling it ahead of
    /// time only moves the cost. Returns immediately after a prior success.
    pub async fn initialize(&self) -> Result<()> {
        self.session.embedded().await?;
        Ok(())
    }

    /// Identity created by the last embedded baseline creation.
    pub async fn active_simulator(&self) -> Option<SimulatorId> {
        self.session.active().await
    }

    /// List simulators.
    ///
    /// Served locally by default: the result is the active identity alone,
    /// or empty before any embedded creation. The remote service is not
    /// asked unless the route is changed.
    pub async fn list_simulators(&self) -> Result<Vec<SimulatorResponse>> {
        let operation = Operation::ListSimulators;
        match self.route(operation) {
            Backend::Local => Ok(self
                .session
                .active()
                .await
                .map(|id| SimulatorResponse { id })
                .into_iter()
                .collect()),
            Backend::Remote => Ok(self.transport.get("/workspaces").await?),
            backend => unsupported(operation, backend),
        }
    }

    pub async fn create_minimal_simulator(
        &self,
        configuration: &MinimalSimulatorConfiguration,
    ) -> Result<SimulatorResponse> {
        let operation = Operation::CreateMinimalSimulator;
        match self.route(operation) {
            Backend::Remote => Ok(self.transport.post("/workspaces", Some(configuration)).await?),
            backend => unsupported(operation, backend),
        }
    }

    /// Create a simulator from a baseline configuration.
    ///
    /// On the embedded backend the returned identity becomes the session's
    /// active identity.
    pub async fn create_baseline_simulator(
        &self,
        configuration: &BaselineConfiguration,
    ) -> Result<SimulatorResponse> {
        let operation = Operation::CreateBaselineSimulator;
        match self.route(operation) {
            Backend::Embedded => {
                let handle = self.session.embedded().await?;
                let id = handle
                    .capability()
                    .create_simulator_from_configuration(configuration, handle.unit_of_work())
                    .await?;

                if let Some(previous) = self.session.activate(id.clone()).await {
                    tracing::debug!("Simulator {} supersedes {}", id, previous);
                }
                tracing::info!("Created embedded simulator {}", id);

                Ok(SimulatorResponse { id })
            }
            Backend::Remote => Ok(self
                .transport
                .post("/workspaces/baseline", Some(configuration))
                .await?),
            backend => unsupported(operation, backend),
        }
    }

    pub async fn list_snapshots(&self) -> Result<Vec<SnapshotResponse>> {
        let operation = Operation::ListSnapshots;
        match self.route(operation) {
            Backend::Remote => Ok(self.transport.get("/snapshots").await?),
            backend => unsupported(operation, backend),
        }
    }

    pub async fn create_snapshot(&self, request: &CreateSnapshotCommand) -> Result<SnapshotResponse> {
        let operation = Operation::CreateSnapshot;
        match self.route(operation) {
            Backend::Remote => Ok(self.transport.post("/snapshots", Some(request)).await?),
            backend => unsupported(operation, backend),
        }
    }

    pub async fn load_snapshot(&self, snapshot_id: &str) -> Result<String> {
        let operation = Operation::LoadSnapshot;
        match self.route(operation) {
            Backend::Remote => {
                let path = format!("/snapshots/{}/load", snapshot_id);
                Ok(self.transport.post::<(), _>(&path, None).await?)
            }
            backend => unsupported(operation, backend),
        }
    }

    /// Run a plan against the simulator `id`.
    ///
    /// The caller-supplied identity is used as-is on every backend.
    pub async fn run(&self, id: &SimulatorId, request: &RunRequest) -> Result<Vec<OperationLog>> {
        let operation = Operation::Run;
        match self.route(operation) {
            Backend::Embedded => {
                let handle = self.session.embedded().await?;
                Ok(handle
                    .capability()
                    .run_simulator_with_plan(id, &request.plan, handle.unit_of_work())
                    .await?)
            }
            Backend::Remote => {
                let path = format!("/workspaces/run/{}", id.as_path_segment());
                Ok(self.transport.post(&path, Some(request)).await?)
            }
            backend => unsupported(operation, backend),
        }
    }

    pub async fn get_latest_log(&self, id: &SimulatorId) -> Result<OperationLog> {
        let operation = Operation::GetLatestLog;
        match self.route(operation) {
            Backend::Remote => {
                let path = format!("/workspaces/logs/{}/latest", id.as_path_segment());
                Ok(self.transport.get(&path).await?)
            }
            backend => unsupported(operation, backend),
        }
    }

    /// Fetch the logs of a simulator.
    ///
    /// On the embedded backend this ignores `id` and re-runs an empty plan
    /// against the active identity, so it fails with
    /// [`FacadeError::InvalidState`] before any embedded creation.
    pub async fn get_logs(&self, id: &SimulatorId) -> Result<Vec<OperationLog>> {
        let operation = Operation::GetLogs;
        match self.route(operation) {
            Backend::Embedded => {
                let active = self
                    .session
                    .active()
                    .await
                    .ok_or(FacadeError::InvalidState { operation })?;
                if &active != id {
                    tracing::debug!("get_logs for {} answered from active simulator {}", id, active);
                }

                let handle = self.session.embedded().await?;
                Ok(handle
                    .capability()
                    .run_simulator_with_plan(&active, "", handle.unit_of_work())
                    .await?)
            }
            Backend::Remote => {
                let path = format!("/workspaces/logs/{}", id.as_path_segment());
                Ok(self.transport.get(&path).await?)
            }
            backend => unsupported(operation, backend),
        }
    }

    pub async fn list_skills(&self) -> Result<Vec<Skill>> {
        let operation = Operation::ListSkills;
        match self.route(operation) {
            Backend::Remote => Ok(self.transport.get("/skills").await?),
            backend => unsupported(operation, backend),
        }
    }

    fn route(&self, operation: Operation) -> Backend {
        let backend = self.routes.backend(operation);
        tracing::debug!("Routing {} to {} backend", operation, backend);
        backend
    }
}

fn unsupported<T>(operation: Operation, backend: Backend) -> Result<T> {
    Err(FacadeError::UnsupportedRoute { operation, backend })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("facade requires an HTTP fetch implementation")]
    MissingFetch,

    #[error("facade requires an embedded runtime source")]
    MissingRuntimeSource,
}

/// Builder for [`SimulatorFacade`].
///
/// The base URL defaults to [`crate::config::DEFAULT_BASE_URL`]; the fetch
/// implementation and the runtime source have no defaults.
pub struct FacadeBuilder {
    base_url: String,
    routes: RoutingTable,
    packages: Vec<PackageSpec>,
    fetch: Option<Arc<dyn HttpFetch>>,
    runtime_source: Option<Arc<dyn RuntimeSource>>,
}

impl FacadeBuilder {
    fn new() -> Self {
        let defaults = FacadeConfig::default();
        Self {
            base_url: defaults.base_url,
            routes: defaults.routes,
            packages: defaults.packages,
            fetch: None,
            runtime_source: None,
        }
    }

    /// Take base URL, routes and install plan from a configuration.
    pub fn config(mut self, config: &FacadeConfig) -> Self {
        self.base_url = config.base_url.clone();
        self.routes = config.routes.clone();
        self.packages = config.packages.clone();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn routes(mut self, routes: RoutingTable) -> Self {
        self.routes = routes;
        self
    }

    /// Override the ordered embedded install plan.
    pub fn packages(mut self, packages: Vec<PackageSpec>) -> Self {
        self.packages = packages;
        self
    }

    pub fn fetch(mut self, fetch: Arc<dyn HttpFetch>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    pub fn runtime_source(mut self, source: Arc<dyn RuntimeSource>) -> Self {
        self.runtime_source = Some(source);
        self
    }

    pub fn build(self) -> std::result::Result<SimulatorFacade, BuildError> {
        let fetch = self.fetch.ok_or(BuildError::MissingFetch)?;
        let source = self
            .runtime_source
            .ok_or(BuildError::MissingRuntimeSource)?;

        Ok(SimulatorFacade {
            transport: Transport::new(self.base_url, fetch),
            session: Session::new(EmbeddedRuntimeLoader::new(source, self.packages)),
            routes: self.routes,
        })
    }
}
