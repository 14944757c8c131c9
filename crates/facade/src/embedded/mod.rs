//! In-process execution environment for simulator logic.
//!
//! Bringing the embedded runtime up is a three-step affair:
//!
//! ```text
//! RuntimeSource::acquire()            expensive, once per facade
//!   └─→ Interpreter::install_package  fixed, ordered install plan
//!         └─→ Interpreter::resolve_capability
//!               └─→ EmbeddedCapability::create_unit_of_work
//! ```
//!
//! [`EmbeddedRuntimeLoader`] runs that sequence at most once and hands every
//! embedded-routed operation the same [`EmbeddedHandle`].
mod loader;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod python;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use simulator_core::{BaselineConfiguration, OperationLog, SimulatorId};

pub use loader::{EmbeddedHandle, EmbeddedRuntimeLoader};
pub use python::{PythonConfig, PythonRuntimeSource};

use crate::error::{EmbeddedError, RuntimeSourceError};

/// Where a package comes from during installation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackageOrigin {
    /// Shipped with the runtime distribution; only needs loading.
    Bundled,
    /// Fetched from the package index.
    Index,
}

/// One step of the ordered install plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub origin: PackageOrigin,
    /// Whether the installer may pull the package's own dependencies.
    pub with_dependencies: bool,
}

impl PackageSpec {
    pub fn bundled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            origin: PackageOrigin::Bundled,
            with_dependencies: true,
        }
    }

    pub fn index(name: &str) -> Self {
        Self {
            name: name.to_string(),
            origin: PackageOrigin::Index,
            with_dependencies: true,
        }
    }

    pub fn without_dependencies(mut self) -> Self {
        self.with_dependencies = false;
        self
    }

    /// The install plan the simulator package needs, in order.
    pub fn default_plan() -> Vec<PackageSpec> {
        vec![
            PackageSpec::bundled("pydantic"),
            PackageSpec::bundled("micropip"),
            PackageSpec::bundled("sqlite3"),
            PackageSpec::bundled("lzma"),
            PackageSpec::index("loguru"),
            PackageSpec::index("lark"),
            PackageSpec::index("numpy"),
            PackageSpec::index("pyyaml"),
            PackageSpec::index("pyfunctional"),
            PackageSpec::index("simaple").without_dependencies(),
        ]
    }
}

/// Opaque unit-of-work context required by every embedded call.
///
/// The token is minted by the capability; it keeps simulator instances
/// created by one call visible to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnitOfWork(u64);

impl UnitOfWork {
    pub fn new(token: u64) -> Self {
        Self(token)
    }

    pub fn token(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uow#{}", self.0)
    }
}

/// Produces fresh interpreter environments.
#[async_trait]
pub trait RuntimeSource: Send + Sync {
    /// Acquire a new interpreter. This is the expensive step.
    async fn acquire(&self) -> Result<Box<dyn Interpreter>, RuntimeSourceError>;
}

/// An acquired interpreter that still needs its packages.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn install_package(&mut self, package: &PackageSpec) -> Result<(), RuntimeSourceError>;

    /// Expose the simulator entry points once every package is installed.
    async fn resolve_capability(
        &mut self,
    ) -> Result<Arc<dyn EmbeddedCapability>, RuntimeSourceError>;
}

/// The two simulator entry points exposed by the embedded runtime.
#[async_trait]
pub trait EmbeddedCapability: Send + Sync {
    async fn create_unit_of_work(&self) -> Result<UnitOfWork, EmbeddedError>;

    async fn create_simulator_from_configuration(
        &self,
        configuration: &BaselineConfiguration,
        uow: &UnitOfWork,
    ) -> Result<SimulatorId, EmbeddedError>;

    async fn run_simulator_with_plan(
        &self,
        id: &SimulatorId,
        plan: &str,
        uow: &UnitOfWork,
    ) -> Result<Vec<OperationLog>, EmbeddedError>;
}
