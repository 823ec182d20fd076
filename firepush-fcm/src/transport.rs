//! HTTP transport used by the FCM client.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::trace;

use crate::config::HttpOptions;
use crate::{PushError, Result};

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as JSON, falling back to the raw text.
    pub fn json(&self) -> Value {
        if self.body.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}

/// Sends authorized JSON requests.
///
/// Any response that arrives, whatever its status, is an `Ok`. Only
/// failures to complete the exchange are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON with a bearer token.
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<HttpResponse>;

    /// GET with a bearer token.
    async fn get_json(&self, url: &str, bearer: &str) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client from the configured options.
    pub fn new(options: &HttpOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = options.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        let client = builder
            .build()
            .map_err(|e| PushError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn finish(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        trace!(status, "HTTP exchange completed");
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        Self::finish(response).await
    }

    async fn get_json(&self, url: &str, bearer: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        Self::finish(response).await
    }
}
