//! # Firepush FCM
//!
//! Firebase Cloud Messaging HTTP v1 client.
//!
//! ## Features
//!
//! - **Multicast**: one `messages:send` call per device token, results kept in order
//! - **Failed tokens**: tokens FCM rejects are collected for cleanup
//! - **Topics**: send to a topic or a condition, manage topic membership
//! - **OAuth2**: service-account JWT exchange with cached access tokens
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use firepush_fcm::prelude::*;
//!
//! # async fn example() -> firepush_fcm::Result<()> {
//! let config = FcmConfig::new("my-firebase-project", "fcmCertificates/fcm-admin-sdk.json");
//! let mut fcm = FcmHttpV1::new(config)?;
//!
//! let notification = NotificationPayload::new("New Message", "You have a new message!");
//! let data = DataPayload::defaults();
//!
//! let feedback = fcm
//!     .send_push_notification(&["device-token".to_string()], &notification, &data)
//!     .await;
//!
//! println!("{}", feedback.to_json());
//! println!("failed: {:?}", fcm.failed_device_tokens());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
mod error;
pub mod fcm;
mod feedback;
pub mod message;
mod notification;
mod provider;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use auth::{ServiceAccountTokenSource, TokenProvider, TokenSource};
pub use config::{FcmConfig, HttpOptions, Priority};
pub use error::{PushError, Result};
pub use fcm::{FcmHttpV1, FcmHttpV1Builder};
pub use feedback::{Feedback, FeedbackBundle, SendResult};
pub use notification::{DataPayload, NotificationPayload};
pub use provider::{PushService, ServiceAccountAuth, TopicMessaging};
pub use transport::{HttpResponse, HttpTransport, Transport};

/// Prelude for common imports.
///
/// ```
/// use firepush_fcm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{FcmConfig, Priority};
    pub use crate::error::{PushError, Result};
    pub use crate::fcm::FcmHttpV1;
    pub use crate::feedback::{Feedback, FeedbackBundle, SendResult};
    pub use crate::notification::{DataPayload, NotificationPayload};
    pub use crate::provider::{PushService, ServiceAccountAuth, TopicMessaging};
}
