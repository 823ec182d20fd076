//! Firebase Cloud Messaging HTTP v1 client.

use async_trait::async_trait;
use firepush_cache::{CacheStore, InMemoryCache};
use firepush_config::ConfigManager;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{ServiceAccountTokenSource, TokenProvider, TokenSource};
use crate::message::{Message, PlatformOverrides, SendRequest, Target, TopicMembershipRequest};
use crate::transport::{HttpResponse, HttpTransport, Transport};
use crate::{
    DataPayload, FcmConfig, Feedback, FeedbackBundle, NotificationPayload, PushService, Result,
    SendResult, ServiceAccountAuth, TopicMessaging,
};

/// Subscribe tokens to a topic.
pub const TOPIC_ADD_URL: &str = "https://iid.googleapis.com/iid/v1:batchAdd";
/// Unsubscribe tokens from a topic.
pub const TOPIC_REMOVE_URL: &str = "https://iid.googleapis.com/iid/v1:batchRemove";
/// Per-token subscription details.
pub const TOPIC_INFO_URL: &str = "https://iid.googleapis.com/iid/info";

/// `messages:send` endpoint of a project.
pub fn send_url(project_id: &str) -> String {
    format!(
        "https://fcm.googleapis.com/v1/projects/{}/messages:send",
        project_id
    )
}

/// FCM HTTP v1 push service.
pub struct FcmHttpV1 {
    config: FcmConfig,
    url: String,
    topic_add_url: String,
    topic_remove_url: String,
    topic_info_url: String,
    transport: Arc<dyn Transport>,
    tokens: TokenProvider,
    feedback: Option<Feedback>,
    failed_device_tokens: Vec<String>,
}

/// Builder for [`FcmHttpV1`] with replaceable collaborators.
pub struct FcmHttpV1Builder {
    config: FcmConfig,
    transport: Option<Arc<dyn Transport>>,
    token_source: Option<Arc<dyn TokenSource>>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl FcmHttpV1Builder {
    /// Use this transport for FCM and instance-id calls.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use this source to mint access tokens.
    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Keep access tokens in this cache.
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<FcmHttpV1> {
        let http = HttpTransport::new(&self.config.http)?;

        let token_source = self
            .token_source
            .unwrap_or_else(|| Arc::new(ServiceAccountTokenSource::new(http.client().clone())));
        let transport = self.transport.unwrap_or_else(|| Arc::new(http));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryCache::new()));

        Ok(FcmHttpV1 {
            url: send_url(&self.config.firebase_project_id),
            topic_add_url: TOPIC_ADD_URL.to_string(),
            topic_remove_url: TOPIC_REMOVE_URL.to_string(),
            topic_info_url: TOPIC_INFO_URL.to_string(),
            config: self.config,
            transport,
            tokens: TokenProvider::new(cache, token_source),
            feedback: None,
            failed_device_tokens: Vec::new(),
        })
    }
}

impl FcmHttpV1 {
    /// Create a client with the default transport, token source and a private cache.
    pub fn new(config: FcmConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Create a client from host configuration, or the bundled defaults.
    pub fn from_config(host: Option<&ConfigManager>) -> Result<Self> {
        Self::new(FcmConfig::resolve(host)?)
    }

    pub fn builder(config: FcmConfig) -> FcmHttpV1Builder {
        FcmHttpV1Builder {
            config,
            transport: None,
            token_source: None,
            cache: None,
        }
    }

    pub fn config(&self) -> &FcmConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn topic_add_url(&self) -> &str {
        &self.topic_add_url
    }

    pub fn topic_remove_url(&self) -> &str {
        &self.topic_remove_url
    }

    pub fn topic_info_url(&self) -> &str {
        &self.topic_info_url
    }

    /// Bearer token for the configured project, from cache when possible.
    pub async fn access_token(&self) -> Result<String> {
        let credential = self.config.certificate.clone().unwrap_or_default();
        self.tokens
            .access_token(
                &self.config.firebase_project_id,
                &credential,
                self.config.token_ttl(),
            )
            .await
    }

    async fn certificate_exists(&self) -> bool {
        match &self.config.certificate {
            Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Records and returns the failure when the key file is missing.
    async fn check_certificate(&mut self) -> Option<SendResult> {
        if self.certificate_exists().await {
            return None;
        }

        warn!(certificate = ?self.config.certificate, "FCM certificate not found");
        let result = SendResult::certificate_not_found();
        self.feedback = Some(Feedback::Single(result.clone()));
        Some(result)
    }

    fn finish(&mut self, result: SendResult) -> SendResult {
        self.feedback = Some(Feedback::Single(result.clone()));
        result
    }

    fn response_result(&self, response: HttpResponse) -> SendResult {
        if self.config.http.http_errors && !response.is_success() {
            return SendResult {
                success: false,
                message: response.json(),
                code: response.status,
            };
        }
        SendResult::success(response.json(), response.status)
    }

    /// POST with a bearer token. `Err` means no response was received.
    async fn post(&self, url: &str, body: Value) -> Result<SendResult> {
        let bearer = self.access_token().await.inspect_err(|e| {
            warn!(error = %e, "Could not obtain FCM access token");
        })?;

        let response = self
            .transport
            .post_json(url, &bearer, &body)
            .await
            .inspect_err(|e| warn!(url, error = %e, "FCM request failed"))?;

        Ok(self.response_result(response))
    }

    async fn send_message(&self, message: &Message) -> Result<SendResult> {
        let request = SendRequest {
            message,
            validate_only: self.config.dry_run,
        };

        let body = serde_json::to_value(&request)?;
        self.post(&self.url, body).await
    }

    /// Send to each token in order, collecting one result per token.
    pub async fn send_to_tokens(
        &mut self,
        tokens: &[String],
        notification: &NotificationPayload,
        data: &DataPayload,
    ) -> Feedback {
        if tokens.is_empty() {
            let feedback = Feedback::Single(SendResult::device_tokens_not_found());
            self.feedback = Some(feedback.clone());
            return feedback;
        }

        if let Some(result) = self.check_certificate().await {
            return Feedback::Single(result);
        }

        self.failed_device_tokens.clear();
        let overrides = PlatformOverrides::for_notification(notification);

        let mut bundle = FeedbackBundle::new();
        let mut failed = Vec::new();

        for token in tokens {
            let message = Message::new(
                Target::Token(token.clone()),
                notification,
                data,
                overrides.as_ref(),
            );
            let result = match self.send_message(&message).await {
                Ok(result) => {
                    if result.is_rejected_token() {
                        failed.push(token.clone());
                    }
                    result
                }
                Err(e) => SendResult::from(&e),
            };
            debug!(token = %token, code = result.code, success = result.success, "FCM send");
            bundle.push(result);
        }

        info!(
            sent = bundle.len(),
            failed = failed.len(),
            "FCM multicast send finished"
        );

        if !failed.is_empty() {
            self.set_failed_device_tokens(failed);
        }

        let feedback = Feedback::Bundle(bundle);
        self.feedback = Some(feedback.clone());
        feedback
    }

    async fn topic_membership(&mut self, url: String, topic: &str, tokens: &[String]) -> SendResult {
        if let Some(result) = self.check_certificate().await {
            return result;
        }

        if tokens.is_empty() {
            return self.finish(SendResult::device_tokens_not_found());
        }

        let body = match serde_json::to_value(TopicMembershipRequest::new(topic, tokens)) {
            Ok(body) => body,
            Err(e) => return self.finish(SendResult::failure(e.to_string(), 0)),
        };

        debug!(topic, tokens = tokens.len(), url = %url, "FCM topic membership change");
        let result = self
            .post(&url, body)
            .await
            .unwrap_or_else(|e| SendResult::from(&e));
        self.finish(result)
    }
}

#[async_trait]
impl PushService for FcmHttpV1 {
    fn name(&self) -> &'static str {
        "fcm"
    }

    fn set_config(&mut self, overrides: Map<String, Value>) -> Result<()> {
        let project_changed = overrides.contains_key("firebase_project_id");
        self.config.apply_overrides(overrides)?;
        if project_changed {
            self.url = send_url(&self.config.firebase_project_id);
        }
        Ok(())
    }

    fn set_url(&mut self, url: String) {
        self.url = url;
    }

    fn set_feedback(&mut self, feedback: Feedback) {
        self.feedback = Some(feedback);
    }

    fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    fn set_failed_device_tokens(&mut self, tokens: Vec<String>) {
        self.failed_device_tokens = tokens;
    }

    fn failed_device_tokens(&self) -> &[String] {
        &self.failed_device_tokens
    }

    async fn send_push_notification(
        &mut self,
        tokens: &[String],
        notification: &NotificationPayload,
        data: &DataPayload,
    ) -> Feedback {
        self.send_to_tokens(tokens, notification, data).await
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "url" => Some(Value::from(self.url.clone())),
            "topic_add_url" => Some(Value::from(self.topic_add_url.clone())),
            "topic_remove_url" => Some(Value::from(self.topic_remove_url.clone())),
            "topic_info_url" => Some(Value::from(self.topic_info_url.clone())),
            "config" => serde_json::to_value(&self.config).ok(),
            "token_cache_time" => Some(Value::from(self.config.token_cache_time)),
            "feedback" => self.feedback.as_ref().and_then(|f| serde_json::to_value(f).ok()),
            "failed_device_tokens" => Some(Value::from(self.failed_device_tokens.clone())),
            _ => None,
        }
    }

    fn topic_messaging(&mut self) -> Option<&mut dyn TopicMessaging> {
        Some(self)
    }

    fn service_account(&mut self) -> Option<&mut dyn ServiceAccountAuth> {
        Some(self)
    }
}

#[async_trait]
impl TopicMessaging for FcmHttpV1 {
    async fn send_to_topic(
        &mut self,
        topic: &str,
        notification: &NotificationPayload,
        data: &DataPayload,
        use_condition: bool,
    ) -> Feedback {
        if topic.is_empty() {
            let feedback = Feedback::Single(SendResult::topic_not_found());
            self.feedback = Some(feedback.clone());
            return feedback;
        }

        if let Some(result) = self.check_certificate().await {
            return Feedback::Single(result);
        }

        let target = if use_condition {
            Target::Condition(topic.to_string())
        } else {
            Target::Topic(topic.to_string())
        };
        let overrides = PlatformOverrides::for_notification(notification);
        let message = Message::new(target, notification, data, overrides.as_ref());

        let result = self
            .send_message(&message)
            .await
            .unwrap_or_else(|e| SendResult::from(&e));
        info!(topic, use_condition, code = result.code, "FCM topic send finished");

        let feedback = Feedback::Bundle(FeedbackBundle::from_iter([result]));
        self.feedback = Some(feedback.clone());
        feedback
    }

    async fn add_tokens_to_topic(&mut self, topic: &str, tokens: &[String]) -> SendResult {
        let url = self.topic_add_url.clone();
        self.topic_membership(url, topic, tokens).await
    }

    async fn remove_tokens_from_topic(&mut self, topic: &str, tokens: &[String]) -> SendResult {
        let url = self.topic_remove_url.clone();
        self.topic_membership(url, topic, tokens).await
    }

    async fn topic_info(&mut self, token: &str) -> SendResult {
        if let Some(result) = self.check_certificate().await {
            return result;
        }

        if token.is_empty() {
            return self.finish(SendResult::device_tokens_not_found());
        }

        let bearer = match self.access_token().await {
            Ok(bearer) => bearer,
            Err(e) => return self.finish(SendResult::from(&e)),
        };

        let url = format!("{}/{}?details=true", self.topic_info_url, token);
        let result = match self.transport.get_json(&url, &bearer).await {
            Ok(response) => self.response_result(response),
            Err(e) => SendResult::from(&e),
        };
        self.finish(result)
    }

    fn set_topic_add_url(&mut self, url: String) {
        self.topic_add_url = url;
    }

    fn set_topic_remove_url(&mut self, url: String) {
        self.topic_remove_url = url;
    }

    fn set_topic_info_url(&mut self, url: String) {
        self.topic_info_url = url;
    }
}

impl ServiceAccountAuth for FcmHttpV1 {
    fn set_project_id(&mut self, project_id: String) {
        self.url = send_url(&project_id);
        self.config.firebase_project_id = project_id;
    }

    fn set_json_credential(&mut self, path: PathBuf) {
        self.config.certificate = Some(path);
    }
}
