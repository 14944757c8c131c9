//! At-most-once initialization of the embedded runtime.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{OnceCell, watch};

use super::{EmbeddedCapability, PackageSpec, RuntimeSource, UnitOfWork};
use crate::error::InitializationError;

/// Capability plus the unit of work every embedded call shares.
#[derive(Clone)]
pub struct EmbeddedHandle {
    capability: Arc<dyn EmbeddedCapability>,
    uow: UnitOfWork,
}

impl EmbeddedHandle {
    pub fn capability(&self) -> &dyn EmbeddedCapability {
        self.capability.as_ref()
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.uow
    }
}

/// Result of one initialization attempt, `None` while it is running.
type Outcome = Option<Result<(), InitializationError>>;

type InFlight = Mutex<Option<watch::Receiver<Outcome>>>;

/// Lazily acquires and initializes the embedded runtime.
///
/// The first caller runs the initialization and publishes its outcome on a
/// watch channel; callers that arrive while it is in flight subscribe to
/// that channel and all observe the same result. A failed attempt is not
/// cached: only a call made after the failure starts a new one. If the
/// running attempt is cancelled, its waiters start over.
pub struct EmbeddedRuntimeLoader {
    source: Arc<dyn RuntimeSource>,
    packages: Vec<PackageSpec>,
    ready: OnceCell<EmbeddedHandle>,
    in_flight: InFlight,
}

impl EmbeddedRuntimeLoader {
    pub fn new(source: Arc<dyn RuntimeSource>, packages: Vec<PackageSpec>) -> Self {
        Self {
            source,
            packages,
            ready: OnceCell::new(),
            in_flight: Mutex::new(None),
        }
    }

    /// Initialize the runtime if needed and return the shared handle.
    ///
    /// Returns immediately once a previous call has succeeded.
    pub async fn ensure_ready(&self) -> Result<&EmbeddedHandle, InitializationError> {
        loop {
            if let Some(handle) = self.ready.get() {
                return Ok(handle);
            }

            let joined = {
                let mut slot = lock(&self.in_flight);
                match slot.as_ref() {
                    Some(receiver) => Err(receiver.clone()),
                    None => {
                        let (sender, receiver) = watch::channel(None);
                        *slot = Some(receiver);
                        Ok(sender)
                    }
                }
            };

            let mut receiver = match joined {
                Ok(sender) => return self.lead(sender).await,
                Err(receiver) => receiver,
            };

            tracing::debug!("Waiting for in-flight embedded initialization");
            // A closed channel without an outcome means the attempt was
            // cancelled; loop and start a new one.
            if let Ok(outcome) = receiver.wait_for(Option::is_some).await {
                if let Some(Err(err)) = outcome.as_ref() {
                    return Err(err.clone());
                }
            }
        }
    }

    /// Run the attempt this caller owns and publish its outcome.
    async fn lead(
        &self,
        sender: watch::Sender<Outcome>,
    ) -> Result<&EmbeddedHandle, InitializationError> {
        let slot = ClearOnDrop(&self.in_flight);

        match self.initialize().await {
            Ok(handle) => {
                let handle = self.ready.get_or_init(|| async move { handle }).await;
                drop(slot);
                sender.send_replace(Some(Ok(())));
                Ok(handle)
            }
            Err(err) => {
                tracing::warn!("Embedded initialization failed: {}", err);
                drop(slot);
                sender.send_replace(Some(Err(err.clone())));
                Err(err)
            }
        }
    }

    async fn initialize(&self) -> Result<EmbeddedHandle, InitializationError> {
        tracing::info!("Acquiring embedded runtime");
        let mut interpreter = self
            .source
            .acquire()
            .await
            .map_err(|e| InitializationError::Acquire(Arc::new(e)))?;

        for package in &self.packages {
            tracing::debug!("Installing package {} ({:?})", package.name, package.origin);
            interpreter
                .install_package(package)
                .await
                .map_err(|source| InitializationError::PackageInstall {
                    package: package.name.clone(),
                    source: Arc::new(source),
                })?;
        }

        let capability = interpreter
            .resolve_capability()
            .await
            .map_err(|e| InitializationError::Resolve(Arc::new(e)))?;
        let uow = capability
            .create_unit_of_work()
            .await
            .map_err(|e| InitializationError::UnitOfWork(Arc::new(e)))?;

        tracing::info!(
            "Embedded runtime ready: {} packages installed, {}",
            self.packages.len(),
            uow
        );

        Ok(EmbeddedHandle { capability, uow })
    }
}

/// Empties the in-flight slot when the owning attempt finishes or is dropped.
struct ClearOnDrop<'a>(&'a InFlight);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, Option<watch::Receiver<Outcome>>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}
