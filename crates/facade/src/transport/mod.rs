//! Minimal JSON-over-HTTP helper for the remote simulator service.
//!
//! [`Transport`] joins paths onto the configured base URL, always sends a
//! JSON content type, performs exactly one fetch per call, and parses the
//! body as JSON. It never retries and never caches.
mod client;
mod fetch;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use client::ReqwestFetch;
pub use fetch::{FetchError, HttpFetch, HttpRequest, HttpResponse, Method};

use crate::error::TransportError;

const CONTENT_TYPE: (&str, &str) = ("content-type", "application/json");

/// Stateless request helper bound to one base URL.
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    fetch: Arc<dyn HttpFetch>,
}

impl Transport {
    pub fn new(base_url: impl Into<String>, fetch: Arc<dyn HttpFetch>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, fetch }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and parse the response body as JSON.
    ///
    /// The HTTP status is not interpreted: whatever JSON the service
    /// returns is handed back, and only a missing response or a non-JSON
    /// body is an error.
    pub async fn send(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let body = body.map(Value::to_string);
        self.dispatch(path, method, body).await
    }

    /// `GET` a path and decode the response into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let value = self.dispatch(path, Method::Get, None).await?;
        self.decode(path, value)
    }

    /// `POST` a path with an optional JSON body and decode the response.
    pub async fn post<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|source| TransportError::Encode {
                path: path.to_string(),
                source,
            })?;
        let value = self.dispatch(path, Method::Post, body).await?;
        self.decode(path, value)
    }

    async fn dispatch(
        &self,
        path: &str,
        method: Method,
        body: Option<String>,
    ) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let request = HttpRequest {
            method,
            url: url.clone(),
            headers: vec![(CONTENT_TYPE.0.to_string(), CONTENT_TYPE.1.to_string())],
            body,
        };

        tracing::debug!("{} {}", method, url);

        let response = self
            .fetch
            .fetch(request)
            .await
            .map_err(|source| TransportError::Network {
                method: method.to_string(),
                url: url.clone(),
                source,
            })?;

        if !response.is_success() {
            tracing::warn!("{} {} answered with status {}", method, url, response.status);
        }

        serde_json::from_slice(&response.body)
            .map_err(|source| TransportError::InvalidJson { url, source })
    }

    fn decode<T: DeserializeOwned>(&self, path: &str, value: Value) -> Result<T, TransportError> {
        serde_json::from_value(value).map_err(|source| TransportError::UnexpectedShape {
            url: format!("{}{}", self.base_url, path),
            source,
        })
    }
}
