//! Send outcomes reported back to the caller.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::Value;

use crate::PushError;

pub(crate) const CERTIFICATE_NOT_FOUND: &str =
    "Please, add your FCM certificate to the fcmCertificates folder.";
pub(crate) const DEVICE_TOKENS_NOT_FOUND: &str =
    "Please, add a device token to send push notification.";
pub(crate) const TOPIC_NOT_FOUND: &str = "Sorry! topic name not found.";

/// Outcome of one HTTP call, or of a precondition that stopped it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct SendResult {
    pub success: bool,
    /// Decoded provider response, or an error text.
    pub message: Value,
    /// HTTP status, a sentinel for precondition failures, or `0`.
    pub code: u16,
}

impl SendResult {
    pub fn success(message: Value, code: u16) -> Self {
        Self {
            success: true,
            message,
            code,
        }
    }

    pub fn failure(message: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            message: Value::String(message.into()),
            code,
        }
    }

    pub fn certificate_not_found() -> Self {
        Self::failure(CERTIFICATE_NOT_FOUND, 401)
    }

    pub fn device_tokens_not_found() -> Self {
        Self::failure(DEVICE_TOKENS_NOT_FOUND, 404)
    }

    pub fn topic_not_found() -> Self {
        Self::failure(TOPIC_NOT_FOUND, 404)
    }

    /// Whether the status marks the target token as invalid or unregistered.
    pub fn is_rejected_token(&self) -> bool {
        matches!(self.code, 400 | 404)
    }
}

impl From<&PushError> for SendResult {
    fn from(err: &PushError) -> Self {
        Self::failure(err.to_string(), err.code())
    }
}

/// Results of a fan-out send, in call order.
///
/// Serializes as an object keyed by call index: `{"0": {...}, "1": {...}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackBundle {
    results: Vec<SendResult>,
}

impl FeedbackBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: SendResult) {
        self.results.push(result);
    }

    pub fn get(&self, index: usize) -> Option<&SendResult> {
        self.results.get(index)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SendResult> {
        self.results.iter()
    }
}

impl FromIterator<SendResult> for FeedbackBundle {
    fn from_iter<I: IntoIterator<Item = SendResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl Serialize for FeedbackBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for (index, result) in self.results.iter().enumerate() {
            map.serialize_entry(&index, result)?;
        }
        map.end()
    }
}

/// Last outcome stored on a push service.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    /// A single call or a precondition failure.
    Single(SendResult),
    /// A send that produced one result per message.
    Bundle(FeedbackBundle),
}

impl Feedback {
    /// Serialize for caller inspection.
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => format!("{{\"success\":false,\"message\":{:?},\"code\":0}}", e.to_string()),
        }
    }

    pub fn as_single(&self) -> Option<&SendResult> {
        match self {
            Self::Single(result) => Some(result),
            Self::Bundle(_) => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&FeedbackBundle> {
        match self {
            Self::Bundle(bundle) => Some(bundle),
            Self::Single(_) => None,
        }
    }
}

impl Serialize for Feedback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(result) => result.serialize(serializer),
            Self::Bundle(bundle) => bundle.serialize(serializer),
        }
    }
}

impl From<SendResult> for Feedback {
    fn from(result: SendResult) -> Self {
        Self::Single(result)
    }
}

impl From<FeedbackBundle> for Feedback {
    fn from(bundle: FeedbackBundle) -> Self {
        Self::Bundle(bundle)
    }
}
