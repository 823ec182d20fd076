//! Push service capability traits.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::{DataPayload, Feedback, NotificationPayload, Result, SendResult};

/// What every push service offers.
///
/// Sends never fail with `Err`: problems are reported through the returned
/// [`Feedback`], which is also kept as the service's last feedback.
#[async_trait]
pub trait PushService: Send + Sync {
    /// Registry name of the service.
    fn name(&self) -> &'static str;

    /// Override individual configuration keys.
    fn set_config(&mut self, overrides: Map<String, Value>) -> Result<()>;

    /// Replace the send endpoint.
    fn set_url(&mut self, url: String);

    /// Replace the stored feedback.
    fn set_feedback(&mut self, feedback: Feedback);

    /// Outcome of the last operation, if any ran.
    fn feedback(&self) -> Option<&Feedback>;

    /// Replace the stored failed tokens.
    fn set_failed_device_tokens(&mut self, tokens: Vec<String>);

    /// Tokens rejected by the provider during the last multicast send.
    fn failed_device_tokens(&self) -> &[String];

    /// Send one notification to each token, in order.
    async fn send_push_notification(
        &mut self,
        tokens: &[String],
        notification: &NotificationPayload,
        data: &DataPayload,
    ) -> Feedback;

    /// Read a named service property.
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "feedback" => self.feedback().and_then(|f| serde_json::to_value(f).ok()),
            "failed_device_tokens" => Some(Value::from(self.failed_device_tokens().to_vec())),
            _ => None,
        }
    }

    /// Topic messaging, when the service supports it.
    fn topic_messaging(&mut self) -> Option<&mut dyn TopicMessaging> {
        None
    }

    /// Service-account settings, when the service authenticates that way.
    fn service_account(&mut self) -> Option<&mut dyn ServiceAccountAuth> {
        None
    }
}

/// Topic and condition delivery plus topic membership management.
#[async_trait]
pub trait TopicMessaging: Send + Sync {
    /// Send to a topic, or to a condition over topics when `use_condition` is set.
    async fn send_to_topic(
        &mut self,
        topic: &str,
        notification: &NotificationPayload,
        data: &DataPayload,
        use_condition: bool,
    ) -> Feedback;

    /// Subscribe tokens to a topic.
    async fn add_tokens_to_topic(&mut self, topic: &str, tokens: &[String]) -> SendResult;

    /// Unsubscribe tokens from a topic.
    async fn remove_tokens_from_topic(&mut self, topic: &str, tokens: &[String]) -> SendResult;

    /// Describe the topics a token is subscribed to.
    async fn topic_info(&mut self, token: &str) -> SendResult;

    fn set_topic_add_url(&mut self, url: String);

    fn set_topic_remove_url(&mut self, url: String);

    fn set_topic_info_url(&mut self, url: String);
}

/// Services authenticating with a service-account key.
pub trait ServiceAccountAuth: Send + Sync {
    /// Target another project. Also rewrites the send endpoint.
    fn set_project_id(&mut self, project_id: String);

    /// Use another key file.
    fn set_json_credential(&mut self, path: PathBuf);
}
