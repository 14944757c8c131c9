//! Unified error types surfaced by the facade.
//!
//! Each layer owns a narrow error enum; [`FacadeError`] aggregates them so
//! callers can match on the failure class without caring which backend
//! served the operation.
use std::sync::Arc;

use thiserror::Error;

use crate::routing::{Backend, Operation};
use crate::transport::FetchError;

pub type Result<T> = std::result::Result<T, FacadeError>;

#[derive(Debug, Error)]
pub enum FacadeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error("{operation} requires an active simulator, but none has been created")]
    InvalidState { operation: Operation },

    #[error("{operation} cannot be served by the {backend} backend")]
    UnsupportedRoute {
        operation: Operation,
        backend: Backend,
    },

    #[error(transparent)]
    Embedded(#[from] EmbeddedError),
}

/// Failures of a single remote round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request {method} {url} failed")]
    Network {
        method: String,
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to encode request body for {path}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} is not valid JSON")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} does not match the expected shape")]
    UnexpectedShape {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures while bringing up the embedded runtime.
///
/// Any of these leaves the loader empty so the next call starts over.
/// Sources are shared so every caller waiting on the same attempt receives
/// the same failure.
#[derive(Clone, Debug, Error)]
pub enum InitializationError {
    #[error("failed to acquire the embedded interpreter")]
    Acquire(#[source] Arc<RuntimeSourceError>),

    #[error("failed to install package `{package}`")]
    PackageInstall {
        package: String,
        #[source]
        source: Arc<RuntimeSourceError>,
    },

    #[error("failed to resolve the embedded simulator capability")]
    Resolve(#[source] Arc<RuntimeSourceError>),

    #[error("failed to create the embedded unit of work")]
    UnitOfWork(#[source] Arc<EmbeddedError>),
}

/// Low-level failures reported by a [`crate::embedded::RuntimeSource`] or
/// one of its interpreters.
#[derive(Debug, Error)]
pub enum RuntimeSourceError {
    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("embedded bridge did not become ready: {0}")]
    Handshake(String),

    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures raised by an embedded entry point after initialization.
#[derive(Debug, Error)]
pub enum EmbeddedError {
    #[error("embedded call `{entry}` raised: {message}")]
    Raised { entry: &'static str, message: String },

    #[error("embedded bridge closed while serving `{entry}`")]
    BridgeClosed { entry: &'static str },

    #[error("embedded bridge I/O failed")]
    Io(#[from] std::io::Error),

    #[error("embedded bridge returned a malformed payload")]
    Decode(#[from] serde_json::Error),
}
