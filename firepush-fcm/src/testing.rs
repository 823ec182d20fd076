//! In-memory doubles for exercising the client without network access.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::auth::{AccessToken, TokenSource};
use crate::config::TOKEN_LIFETIME_SECS;
use crate::transport::{HttpResponse, Transport};
use crate::{PushError, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub bearer: String,
    pub body: Option<Value>,
}

impl RecordedRequest {
    /// `message.token` of a send request.
    pub fn message_token(&self) -> Option<&str> {
        self.body.as_ref()?.get("message")?.get("token")?.as_str()
    }
}

type Responder = dyn Fn(&RecordedRequest) -> Result<HttpResponse> + Send + Sync;

/// Transport that records every request and answers from a closure.
#[derive(Clone)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responder: Arc<Responder>,
}

impl MockTransport {
    /// Answer every request with `200` and a message name.
    pub fn new() -> Self {
        Self::respond_with(|request| {
            Ok(HttpResponse::new(
                200,
                json!({ "name": format!("projects/mock/messages/{}", request.url.len()) })
                    .to_string(),
            ))
        })
    }

    /// Answer with a custom responder.
    pub fn respond_with<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    /// Answer sends with a status chosen by the message token, `200` when unlisted.
    pub fn with_token_statuses<I, K>(statuses: I) -> Self
    where
        I: IntoIterator<Item = (K, u16)>,
        K: Into<String>,
    {
        let statuses: HashMap<String, u16> = statuses
            .into_iter()
            .map(|(token, status)| (token.into(), status))
            .collect();

        Self::respond_with(move |request| {
            let status = request
                .message_token()
                .and_then(|token| statuses.get(token).copied())
                .unwrap_or(200);

            let body = if status == 200 {
                json!({ "name": "projects/mock/messages/1" })
            } else {
                json!({ "error": { "code": status, "status": "UNREGISTERED" } })
            };
            Ok(HttpResponse::new(status, body.to_string()))
        })
    }

    /// Fail every request as if the connection dropped.
    pub fn unreachable() -> Self {
        Self::respond_with(|_| Err(PushError::Network("connection refused".to_string())))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn clear(&self) {
        lock(&self.requests).clear();
    }

    fn handle(&self, request: RecordedRequest) -> Result<HttpResponse> {
        let response = (self.responder)(&request);
        lock(&self.requests).push(request);
        response
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<HttpResponse> {
        self.handle(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            bearer: bearer.to_string(),
            body: Some(body.clone()),
        })
    }

    async fn get_json(&self, url: &str, bearer: &str) -> Result<HttpResponse> {
        self.handle(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            bearer: bearer.to_string(),
            body: None,
        })
    }
}

/// Token source that counts mints and hands out `mock-token-<n>`.
#[derive(Clone)]
pub struct CountingTokenSource {
    calls: Arc<AtomicUsize>,
    credentials: Arc<Mutex<Vec<PathBuf>>>,
    fail_with: Option<u16>,
    expires_in: u64,
}

impl Default for CountingTokenSource {
    fn default() -> Self {
        Self {
            calls: Arc::default(),
            credentials: Arc::default(),
            fail_with: None,
            expires_in: TOKEN_LIFETIME_SECS,
        }
    }
}

impl CountingTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report minted tokens as expiring after `secs`.
    pub fn with_expires_in(mut self, secs: u64) -> Self {
        self.expires_in = secs;
        self
    }

    /// Reject every mint with an auth error carrying `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::default()
        }
    }

    /// Number of mint attempts so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Credential paths passed to each mint, in order.
    pub fn credentials(&self) -> Vec<PathBuf> {
        lock(&self.credentials).clone()
    }
}

#[async_trait]
impl TokenSource for CountingTokenSource {
    async fn fetch_token(&self, credential: &Path, _scope: &str) -> Result<AccessToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.credentials).push(credential.to_path_buf());

        if let Some(status) = self.fail_with {
            return Err(PushError::Auth {
                message: "invalid_grant".to_string(),
                status: Some(status),
            });
        }

        Ok(AccessToken {
            access_token: format!("mock-token-{}", n),
            expires_in: self.expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_records() {
        let transport = MockTransport::with_token_statuses([("bad", 404)]);

        let ok = transport
            .post_json("https://x", "t", &json!({"message": {"token": "good"}}))
            .await
            .unwrap();
        let bad = transport
            .post_json("https://x", "t", &json!({"message": {"token": "bad"}}))
            .await
            .unwrap();

        assert_eq!(ok.status, 200);
        assert_eq!(bad.status, 404);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.requests()[1].message_token(), Some("bad"));
    }

    #[tokio::test]
    async fn test_counting_token_source() {
        let source = CountingTokenSource::new();
        let first = source.fetch_token(Path::new("a.json"), "s").await.unwrap();
        let second = source.fetch_token(Path::new("b.json"), "s").await.unwrap();

        assert_eq!(first.access_token, "mock-token-1");
        assert_eq!(second.access_token, "mock-token-2");
        assert_eq!(source.calls(), 2);
        assert_eq!(source.credentials()[1], PathBuf::from("b.json"));
        assert_eq!(first.expires_in, TOKEN_LIFETIME_SECS);

        let short = CountingTokenSource::new().with_expires_in(90);
        assert_eq!(short.fetch_token(Path::new("a.json"), "s").await.unwrap().expires_in, 90);
    }

    #[tokio::test]
    async fn test_failing_token_source() {
        let err = CountingTokenSource::failing(401)
            .fetch_token(Path::new("a.json"), "s")
            .await
            .unwrap_err();
        assert_eq!(err.code(), 401);
    }
}
