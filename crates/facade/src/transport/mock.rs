//! Scripted [`HttpFetch`] for tests.
//!
//! Unscripted requests are answered the way the remote service answers an
//! unknown route: status 404 with a JSON `detail` body.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::fetch::{FetchError, HttpFetch, HttpRequest, HttpResponse, Method};

/// Canned answer for one `(method, url)` pair.
#[derive(Clone, Debug)]
pub enum MockReply {
    Response(HttpResponse),
    Fail(String),
}

impl MockReply {
    pub fn json(value: Value) -> Self {
        MockReply::Response(HttpResponse::new(200, value.to_string()))
    }

    pub fn raw(status: u16, body: &str) -> Self {
        MockReply::Response(HttpResponse::new(status, body))
    }

    pub fn fail(message: &str) -> Self {
        MockReply::Fail(message.to_string())
    }
}

/// In-memory fetch that records every request it sees.
#[derive(Default)]
pub struct MockFetch {
    replies: Mutex<HashMap<(Method, String), MockReply>>,
    fallback: Option<MockReply>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch whose every call fails at the network level.
    pub fn failing(message: &str) -> Self {
        Self {
            fallback: Some(MockReply::fail(message)),
            ..Self::default()
        }
    }

    /// Script the answer for `method url`.
    pub fn reply(self, method: Method, url: &str, reply: MockReply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert((method, url.to_string()), reply);
        self
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpFetch for MockFetch {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let key = (request.method, request.url.clone());
        self.requests.lock().unwrap().push(request);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .or_else(|| self.fallback.clone());

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Fail(message)) => Err(FetchError::new(message)),
            None => Ok(HttpResponse::new(404, r#"{"detail":"Not Found"}"#)),
        }
    }
}
