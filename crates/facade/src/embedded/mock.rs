//! In-memory embedded runtime for tests.
//!
//! Counts acquisitions, records installs and entry-point calls, and can be
//! told to fail acquisition or a specific package install.
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use simulator_core::{BaselineConfiguration, OperationLog, SimulatorId};

use super::{EmbeddedCapability, Interpreter, PackageSpec, RuntimeSource, UnitOfWork};
use crate::error::{EmbeddedError, RuntimeSourceError};

/// One recorded entry-point invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum EmbeddedCall {
    CreateSimulator {
        configuration: BaselineConfiguration,
        uow: UnitOfWork,
    },
    RunSimulator {
        id: SimulatorId,
        plan: String,
        uow: UnitOfWork,
    },
}

#[derive(Default)]
struct MockState {
    acquisitions: AtomicUsize,
    failing_acquisitions: AtomicUsize,
    failing_package: Mutex<Option<String>>,
    acquire_delay: Mutex<Option<Duration>>,
    installed: Mutex<Vec<String>>,
    units_of_work: AtomicU64,
    next_simulator_id: AtomicI64,
    calls: Mutex<Vec<EmbeddedCall>>,
}

/// Cloneable mock; clones share counters and journals.
#[derive(Clone)]
pub struct MockRuntimeSource {
    state: Arc<MockState>,
}

impl MockRuntimeSource {
    pub fn new() -> Self {
        let state = MockState {
            next_simulator_id: AtomicI64::new(1),
            ..MockState::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Make the next `count` acquisitions fail.
    pub fn fail_acquisitions(self, count: usize) -> Self {
        self.state
            .failing_acquisitions
            .store(count, Ordering::SeqCst);
        self
    }

    /// Make every install of `package` fail until [`Self::clear_failures`].
    pub fn fail_package(self, package: &str) -> Self {
        *self.state.failing_package.lock().unwrap() = Some(package.to_string());
        self
    }

    /// Sleep inside each acquisition, to widen race windows.
    pub fn with_acquire_delay(self, delay: Duration) -> Self {
        *self.state.acquire_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Identifier handed out by the next simulator creation.
    pub fn with_next_simulator_id(self, id: i64) -> Self {
        self.state.next_simulator_id.store(id, Ordering::SeqCst);
        self
    }

    pub fn clear_failures(&self) {
        self.state.failing_acquisitions.store(0, Ordering::SeqCst);
        *self.state.failing_package.lock().unwrap() = None;
    }

    pub fn acquisitions(&self) -> usize {
        self.state.acquisitions.load(Ordering::SeqCst)
    }

    /// Packages installed across all acquisitions, in order.
    pub fn installed(&self) -> Vec<String> {
        self.state.installed.lock().unwrap().clone()
    }

    pub fn units_of_work(&self) -> u64 {
        self.state.units_of_work.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<EmbeddedCall> {
        self.state.calls.lock().unwrap().clone()
    }
}

impl Default for MockRuntimeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuntimeSource for MockRuntimeSource {
    async fn acquire(&self) -> Result<Box<dyn Interpreter>, RuntimeSourceError> {
        self.state.acquisitions.fetch_add(1, Ordering::SeqCst);

        let delay = *self.state.acquire_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self.state.failing_acquisitions.load(Ordering::SeqCst);
        if failing > 0 {
            self.state
                .failing_acquisitions
                .store(failing - 1, Ordering::SeqCst);
            return Err(RuntimeSourceError::Unavailable(
                "runtime download failed".into(),
            ));
        }

        Ok(Box::new(MockInterpreter {
            state: self.state.clone(),
        }))
    }
}

struct MockInterpreter {
    state: Arc<MockState>,
}

#[async_trait]
impl Interpreter for MockInterpreter {
    async fn install_package(&mut self, package: &PackageSpec) -> Result<(), RuntimeSourceError> {
        let failing = self.state.failing_package.lock().unwrap().clone();
        if failing.as_deref() == Some(package.name.as_str()) {
            return Err(RuntimeSourceError::Unavailable(format!(
                "{} not found in index",
                package.name
            )));
        }

        self.state
            .installed
            .lock()
            .unwrap()
            .push(package.name.clone());
        Ok(())
    }

    async fn resolve_capability(
        &mut self,
    ) -> Result<Arc<dyn EmbeddedCapability>, RuntimeSourceError> {
        Ok(Arc::new(MockCapability {
            state: self.state.clone(),
        }))
    }
}

struct MockCapability {
    state: Arc<MockState>,
}

#[async_trait]
impl EmbeddedCapability for MockCapability {
    async fn create_unit_of_work(&self) -> Result<UnitOfWork, EmbeddedError> {
        let token = self.state.units_of_work.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UnitOfWork::new(token))
    }

    async fn create_simulator_from_configuration(
        &self,
        configuration: &BaselineConfiguration,
        uow: &UnitOfWork,
    ) -> Result<SimulatorId, EmbeddedError> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push(EmbeddedCall::CreateSimulator {
                configuration: configuration.clone(),
                uow: *uow,
            });

        let id = self.state.next_simulator_id.fetch_add(1, Ordering::SeqCst);
        Ok(SimulatorId::Int(id))
    }

    async fn run_simulator_with_plan(
        &self,
        id: &SimulatorId,
        plan: &str,
        uow: &UnitOfWork,
    ) -> Result<Vec<OperationLog>, EmbeddedError> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push(EmbeddedCall::RunSimulator {
                id: id.clone(),
                plan: plan.to_string(),
                uow: *uow,
            });

        // The first log of any run is the simulator's initial state.
        let mut logs = vec![OperationLog {
            index: 0,
            command: Some("init".to_string()),
            ..OperationLog::default()
        }];
        logs.extend(
            plan.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .enumerate()
                .map(|(i, line)| OperationLog {
                    index: i + 1,
                    command: Some(line.to_string()),
                    ..OperationLog::default()
                }),
        );
        Ok(logs)
    }
}
