//! Per-facade session state.
//!
//! A [`Session`] owns everything that must stay coherent across calls: the
//! embedded runtime loader (and through it the shared unit of work) and the
//! active simulator identity. Each facade owns exactly one session, so
//! independent facades never observe each other's state.
use tokio::sync::RwLock;

use simulator_core::SimulatorId;

use crate::embedded::{EmbeddedHandle, EmbeddedRuntimeLoader};
use crate::error::InitializationError;

pub struct Session {
    loader: EmbeddedRuntimeLoader,
    active: RwLock<Option<SimulatorId>>,
}

impl Session {
    pub fn new(loader: EmbeddedRuntimeLoader) -> Self {
        Self {
            loader,
            active: RwLock::new(None),
        }
    }

    /// Embedded handle, initializing the runtime on first use.
    pub async fn embedded(&self) -> Result<&EmbeddedHandle, InitializationError> {
        self.loader.ensure_ready().await
    }

    /// The most recently created embedded simulator, if any.
    pub async fn active(&self) -> Option<SimulatorId> {
        self.active.read().await.clone()
    }

    /// Replace the active identity, returning the one it supersedes.
    pub async fn activate(&self, id: SimulatorId) -> Option<SimulatorId> {
        self.active.write().await.replace(id)
    }
}
