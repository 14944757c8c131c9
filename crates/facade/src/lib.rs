//! Client-side facade over a game-mechanics simulator.
//!
//! The simulator may live behind a remote HTTP service or inside an
//! embedded runtime that is loaded lazily. [`SimulatorFacade`] hides that
//! split behind one operation set and keeps the session state (embedded
//! handle, active simulator identity) per facade instance.
//!
//! Modules are organized by responsibility:
//! - [`facade`] hosts the operation set and its builder
//! - [`routing`] maps operations to backends
//! - [`session`] owns per-facade state
//! - [`transport`] talks JSON over HTTP to the remote service
//! - [`embedded`] acquires and initializes the embedded runtime
//! - [`config`] loads settings from the environment
pub mod config;
pub mod embedded;
pub mod error;
pub mod facade;
pub mod routing;
pub mod session;
pub mod transport;

pub use config::FacadeConfig;
pub use embedded::{
    EmbeddedCapability, EmbeddedHandle, EmbeddedRuntimeLoader, Interpreter, PackageOrigin,
    PackageSpec, PythonConfig, PythonRuntimeSource, RuntimeSource, UnitOfWork,
};
pub use error::{
    EmbeddedError, FacadeError, InitializationError, Result, RuntimeSourceError, TransportError,
};
pub use facade::{BuildError, FacadeBuilder, SimulatorFacade};
pub use routing::{Backend, Operation, RouteParseError, RoutingTable};
pub use session::Session;
pub use transport::{FetchError, HttpFetch, HttpRequest, HttpResponse, Method, ReqwestFetch, Transport};
