//! FCM HTTP v1 message envelope.

use serde::Serialize;

use crate::{DataPayload, NotificationPayload};

/// Where a message is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// A single device registration token.
    Token(String),
    /// Every device subscribed to a topic.
    Topic(String),
    /// Devices matching a boolean expression over topics,
    /// e.g. `'dogs' in topics || 'cats' in topics`.
    Condition(String),
}

/// A message as sent to `messages:send`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(flatten)]
    pub target: Target,
    pub notification: NotificationPayload,
    pub data: DataPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpush: Option<WebpushConfig>,
}

impl Message {
    /// Build a message, attaching platform overrides when given.
    pub fn new(
        target: Target,
        notification: &NotificationPayload,
        data: &DataPayload,
        overrides: Option<&PlatformOverrides>,
    ) -> Self {
        let (android, apns, webpush) = match overrides {
            Some(o) => (
                Some(o.android.clone()),
                Some(o.apns.clone()),
                Some(o.webpush.clone()),
            ),
            None => (None, None, None),
        };

        Self {
            target,
            notification: notification.clone(),
            data: data.clone(),
            android,
            apns,
            webpush,
        }
    }
}

/// Rich-media overrides for Android, APNs and Web Push.
///
/// Built once per send and attached to every message of that send.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformOverrides {
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
    pub webpush: WebpushConfig,
}

impl PlatformOverrides {
    /// Overrides carrying the notification image, or `None` without one.
    pub fn for_notification(notification: &NotificationPayload) -> Option<Self> {
        let image = notification.image_url()?.to_string();

        Some(Self {
            android: AndroidConfig {
                notification: AndroidNotification {
                    image: image.clone(),
                },
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps { mutable_content: 1 },
                    image: image.clone(),
                },
                fcm_options: FcmOptions {
                    image: image.clone(),
                },
            },
            webpush: WebpushConfig {
                headers: WebpushHeaders { image },
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndroidNotification {
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
    pub fcm_options: FcmOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aps {
    #[serde(rename = "mutable-content")]
    pub mutable_content: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FcmOptions {
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebpushConfig {
    pub headers: WebpushHeaders,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebpushHeaders {
    pub image: String,
}

/// Body of a `messages:send` request.
#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    pub message: &'a Message,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub validate_only: bool,
}

/// Body of an instance-id `batchAdd`/`batchRemove` request.
#[derive(Debug, Serialize)]
pub(crate) struct TopicMembershipRequest<'a> {
    pub to: String,
    pub registration_tokens: &'a [String],
}

impl<'a> TopicMembershipRequest<'a> {
    pub fn new(topic: &str, tokens: &'a [String]) -> Self {
        Self {
            to: format!("topics/{}", topic),
            registration_tokens: tokens,
        }
    }
}
