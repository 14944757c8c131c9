//! Data model shared by the simulator facade and its front-ends.
//!
//! Everything here is plain serde data. The facade forwards these values to
//! either the remote service or the embedded runtime without interpreting
//! simulation semantics, so most payloads keep unknown fields around instead
//! of rejecting them.
pub mod configuration;
pub mod id;
pub mod log;
pub mod request;
pub mod response;

pub use configuration::{BaselineConfiguration, MinimalSimulatorConfiguration};
pub use id::SimulatorId;
pub use log::OperationLog;
pub use request::{CreateSnapshotCommand, RunRequest};
pub use response::{SimulatorResponse, Skill, SnapshotResponse};
