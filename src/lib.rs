//! # Firepush
//!
//! Push notifications through Firebase Cloud Messaging HTTP v1.
//!
//! [`PushNotification`] collects a title, body, image, data and device
//! tokens through chainable setters, then sends them with the active push
//! service. Afterwards the service's feedback and the tokens FCM rejected
//! are available for inspection.
//!
//! ```rust,no_run
//! use firepush::prelude::*;
//!
//! # async fn example() -> firepush::Result<()> {
//! let mut push = PushNotification::new()?;
//!
//! push.set_project_id("my-firebase-project")
//!     .set_json_credential("fcmCertificates/fcm-admin-sdk.json")
//!     .set_title("Weekly digest")
//!     .set_body("Five new stories are waiting")
//!     .set_devices_token(["token-1", "token-2"])
//!     .send()
//!     .await;
//!
//! if let Some(feedback) = push.feedback() {
//!     println!("{}", feedback.to_json());
//! }
//! for token in push.failed_device_tokens() {
//!     println!("prune {}", token);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The member crates are re-exported for direct use: [`cache`] for token
//! stores, [`config`] for layered configuration and [`fcm`] for the client.

mod facade;

pub use facade::{
    AVAILABLE_SERVICES, DEFAULT_SERVICE, DeviceTokens, PushNotification, PushNotificationBuilder,
};

pub use firepush_cache as cache;
pub use firepush_config as config;
pub use firepush_fcm as fcm;

pub use firepush_fcm::{
    DataPayload, FcmConfig, FcmHttpV1, Feedback, FeedbackBundle, NotificationPayload, PushError,
    PushService, Result, SendResult, TopicMessaging,
};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::facade::{DeviceTokens, PushNotification};
    pub use firepush_fcm::prelude::*;
}
