//! Chainable notification builder in front of a push service.

use firepush_cache::{CacheStore, InMemoryCache};
use firepush_config::ConfigManager;
use firepush_fcm::auth::TokenSource;
use firepush_fcm::{
    DataPayload, FcmConfig, FcmHttpV1, Feedback, NotificationPayload, PushError, PushService,
    Result, SendResult, Transport,
};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Service used when none, or an unknown one, is requested.
pub const DEFAULT_SERVICE: &str = "fcm";

/// Names accepted by [`PushNotification::set_service`].
pub const AVAILABLE_SERVICES: &[&str] = &["fcm"];

fn resolve_service(name: &str) -> &'static str {
    match AVAILABLE_SERVICES.iter().find(|s| **s == name) {
        Some(service) => *service,
        None => {
            debug!(requested = name, fallback = DEFAULT_SERVICE, "Unknown push service");
            DEFAULT_SERVICE
        }
    }
}

/// One or many device tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTokens(Vec<String>);

impl DeviceTokens {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for DeviceTokens {
    fn from(token: &str) -> Self {
        Self(vec![token.to_string()])
    }
}

impl From<String> for DeviceTokens {
    fn from(token: String) -> Self {
        Self(vec![token])
    }
}

impl From<Vec<String>> for DeviceTokens {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

impl From<&[&str]> for DeviceTokens {
    fn from(tokens: &[&str]) -> Self {
        Self(tokens.iter().map(|t| t.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for DeviceTokens {
    fn from(tokens: [&str; N]) -> Self {
        Self(tokens.iter().map(|t| t.to_string()).collect())
    }
}

/// Collaborators handed to every service the facade creates.
#[derive(Clone)]
struct ServiceParts {
    config: FcmConfig,
    cache: Arc<dyn CacheStore>,
    transport: Option<Arc<dyn Transport>>,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl ServiceParts {
    fn create(&self, name: &'static str) -> Result<Box<dyn PushService>> {
        match name {
            "fcm" => {
                let mut builder = FcmHttpV1::builder(self.config.clone()).cache(self.cache.clone());
                if let Some(transport) = &self.transport {
                    builder = builder.transport(transport.clone());
                }
                if let Some(source) = &self.token_source {
                    builder = builder.token_source(source.clone());
                }
                Ok(Box::new(builder.build()?))
            }
            other => Err(PushError::Config(format!("No push service named '{}'", other))),
        }
    }
}

/// Builder for [`PushNotification`].
#[derive(Default)]
pub struct PushNotificationBuilder {
    service: Option<String>,
    host_config: Option<ConfigManager>,
    config: Option<FcmConfig>,
    cache: Option<Arc<dyn CacheStore>>,
    transport: Option<Arc<dyn Transport>>,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl PushNotificationBuilder {
    /// Service to start with. Unknown names fall back to [`DEFAULT_SERVICE`].
    pub fn service(mut self, name: impl Into<String>) -> Self {
        self.service = Some(name.into());
        self
    }

    /// Read the `fcm` section from the host application's configuration.
    pub fn host_config(mut self, manager: ConfigManager) -> Self {
        self.host_config = Some(manager);
        self
    }

    /// Use a ready-made configuration, skipping resolution.
    pub fn config(mut self, config: FcmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a token cache with the host application.
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Resolve configuration and create the initial service.
    pub fn build(self) -> Result<PushNotification> {
        let config = match self.config {
            Some(config) => config,
            None => FcmConfig::resolve(self.host_config.as_ref())?,
        };

        let parts = ServiceParts {
            config,
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(InMemoryCache::new())),
            transport: self.transport,
            token_source: self.token_source,
        };

        let service_name = resolve_service(self.service.as_deref().unwrap_or(DEFAULT_SERVICE));
        let service = parts.create(service_name)?;

        Ok(PushNotification {
            service_name,
            service,
            parts,
            device_tokens: Vec::new(),
            notification: NotificationPayload::default(),
            data: DataPayload::defaults(),
        })
    }
}

/// Accumulates a notification and sends it through the active push service.
///
/// ```rust,no_run
/// use firepush::PushNotification;
///
/// # async fn example() -> firepush::Result<()> {
/// let mut push = PushNotification::new()?;
/// push.set_title("Order shipped")
///     .set_body("Your order is on its way")
///     .set_devices_token(["token-1", "token-2"]);
///
/// push.send().await;
/// println!("{:?}", push.failed_device_tokens());
/// # Ok(())
/// # }
/// ```
pub struct PushNotification {
    service_name: &'static str,
    service: Box<dyn PushService>,
    parts: ServiceParts,
    device_tokens: Vec<String>,
    notification: NotificationPayload,
    data: DataPayload,
}

impl PushNotification {
    /// Default service, configured from the bundled file and environment.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Named service, falling back to the default for unknown names.
    pub fn with_service(name: &str) -> Result<Self> {
        Self::builder().service(name).build()
    }

    pub fn builder() -> PushNotificationBuilder {
        PushNotificationBuilder::default()
    }

    /// Name of the active service.
    pub fn service_name(&self) -> &str {
        self.service_name
    }

    pub fn service(&self) -> &dyn PushService {
        self.service.as_ref()
    }

    pub fn device_tokens(&self) -> &[String] {
        &self.device_tokens
    }

    pub fn notification(&self) -> &NotificationPayload {
        &self.notification
    }

    pub fn data(&self) -> &DataPayload {
        &self.data
    }

    /// Switch to a fresh instance of the named service.
    ///
    /// Configuration overrides, feedback and failed tokens of the previous
    /// service are discarded. The token cache is kept.
    pub fn set_service(&mut self, name: &str) -> Result<&mut Self> {
        let service_name = resolve_service(name);
        self.service = self.parts.create(service_name)?;
        self.service_name = service_name;
        Ok(self)
    }

    pub fn set_notification(&mut self, notification: NotificationPayload) -> &mut Self {
        self.notification = notification;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.notification.title = title.into();
        self
    }

    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.notification.body = body.into();
        self
    }

    pub fn set_image(&mut self, url: impl Into<String>) -> &mut Self {
        self.notification.image = Some(url.into());
        self
    }

    /// Replace the whole data payload.
    pub fn set_data(&mut self, data: DataPayload) -> &mut Self {
        self.data = data;
        self
    }

    pub fn set_devices_token(&mut self, tokens: impl Into<DeviceTokens>) -> &mut Self {
        self.device_tokens = tokens.into().into_vec();
        self
    }

    /// Override configuration keys of the active service.
    pub fn set_config(&mut self, overrides: Map<String, Value>) -> Result<&mut Self> {
        self.service.set_config(overrides)?;
        Ok(self)
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.service.set_url(url.into());
        self
    }

    pub fn set_project_id(&mut self, project_id: impl Into<String>) -> &mut Self {
        match self.service.service_account() {
            Some(auth) => auth.set_project_id(project_id.into()),
            None => debug!(service = self.service_name, "Service has no project id"),
        }
        self
    }

    pub fn set_json_credential(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        match self.service.service_account() {
            Some(auth) => auth.set_json_credential(path.into()),
            None => debug!(service = self.service_name, "Service takes no credential file"),
        }
        self
    }

    pub fn set_topic_add_url(&mut self, url: impl Into<String>) -> &mut Self {
        if let Some(topics) = self.service.topic_messaging() {
            topics.set_topic_add_url(url.into());
        }
        self
    }

    pub fn set_topic_remove_url(&mut self, url: impl Into<String>) -> &mut Self {
        if let Some(topics) = self.service.topic_messaging() {
            topics.set_topic_remove_url(url.into());
        }
        self
    }

    pub fn set_topic_info_url(&mut self, url: impl Into<String>) -> &mut Self {
        if let Some(topics) = self.service.topic_messaging() {
            topics.set_topic_info_url(url.into());
        }
        self
    }

    /// Send the notification to every accumulated token.
    pub async fn send(&mut self) -> &mut Self {
        self.service
            .send_push_notification(&self.device_tokens, &self.notification, &self.data)
            .await;
        self
    }

    /// Send to a topic or condition. Does nothing when the active service
    /// has no topic support.
    pub async fn send_by_topic(&mut self, topic: &str, use_condition: bool) -> &mut Self {
        match self.service.topic_messaging() {
            Some(topics) => {
                topics
                    .send_to_topic(topic, &self.notification, &self.data, use_condition)
                    .await;
            }
            None => debug!(service = self.service_name, topic, "Topic sends not supported"),
        }
        self
    }

    /// Outcome of the last service operation.
    pub fn feedback(&self) -> Option<&Feedback> {
        self.service.feedback()
    }

    /// Tokens rejected during the last send.
    pub fn failed_device_tokens(&self) -> &[String] {
        self.service.failed_device_tokens()
    }

    /// Subscribe the accumulated tokens to `topic`.
    pub async fn add_device_token_to_topic(&mut self, topic: &str) -> Option<SendResult> {
        let topics = self.service.topic_messaging()?;
        Some(topics.add_tokens_to_topic(topic, &self.device_tokens).await)
    }

    /// Unsubscribe the accumulated tokens from `topic`.
    pub async fn remove_device_token_from_topic(&mut self, topic: &str) -> Option<SendResult> {
        let topics = self.service.topic_messaging()?;
        Some(topics.remove_tokens_from_topic(topic, &self.device_tokens).await)
    }

    /// Topics `token` is subscribed to.
    pub async fn topic_info(&mut self, token: &str) -> Option<SendResult> {
        let topics = self.service.topic_messaging()?;
        Some(topics.topic_info(token).await)
    }

    /// Read a property of the facade, or else of the active service.
    pub fn get(&self, property: &str) -> Option<Value> {
        match property {
            "service" => Some(Value::from(self.service_name)),
            "device_tokens" => Some(Value::from(self.device_tokens.clone())),
            "notification" => serde_json::to_value(&self.notification).ok(),
            "data" => Some(Value::Object(self.data.as_map().clone())),
            _ => self.service.property(property),
        }
    }
}
