//! Production [`HttpFetch`] backed by `reqwest`.
use std::time::Duration;

use async_trait::async_trait;

use super::fetch::{FetchError, HttpFetch, HttpRequest, HttpResponse, Method};

/// `reqwest`-based fetch implementation.
#[derive(Clone, Debug, Default)]
pub struct ReqwestFetch {
    http_client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::with_source("failed to build HTTP client", e))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = match request.method {
            Method::Get => self.http_client.get(&request.url),
            Method::Post => self.http_client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            FetchError::with_source(format!("failed to send request to {}", request.url), e)
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::with_source("failed to read response body", e))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}
