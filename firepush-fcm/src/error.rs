//! Push notification error types.

use thiserror::Error;

/// Result type for push operations.
pub type Result<T> = std::result::Result<T, PushError>;

/// Push notification errors.
///
/// Only configuration errors escape the public send API. Everything else is
/// folded into a [`SendResult`](crate::SendResult) by the client.
#[derive(Debug, Error)]
pub enum PushError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential file could not be read or parsed.
    #[error("Invalid credential: {0}")]
    Credential(String),

    /// Authentication error, with the token endpoint's status when known.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Error detail.
        message: String,
        /// HTTP status returned by the token endpoint.
        status: Option<u16>,
    },

    /// The provider answered with an error status.
    #[error("Provider error {status}: {body}")]
    Provider {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Network error.
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error.
    #[error("Operation timed out")]
    Timeout,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Token cache failure.
    #[error("Cache error: {0}")]
    Cache(#[from] firepush_cache::CacheError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PushError {
    /// Status code reported in feedback, `0` when the failure has none.
    pub fn code(&self) -> u16 {
        match self {
            Self::Auth {
                status: Some(status),
                ..
            } => *status,
            Self::Provider { status, .. } => *status,
            _ => 0,
        }
    }
}

impl From<reqwest::Error> for PushError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Provider {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else if err.is_connect() || err.is_request() {
            Self::Network(err.to_string())
        } else {
            Self::Serialization(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PushError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for PushError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Credential(err.to_string())
    }
}

impl From<firepush_config::ConfigError> for PushError {
    fn from(err: firepush_config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let provider = PushError::Provider {
            status: 404,
            body: "NOT_FOUND".to_string(),
        };
        assert_eq!(provider.code(), 404);

        let auth = PushError::Auth {
            message: "invalid_grant".to_string(),
            status: Some(400),
        };
        assert_eq!(auth.code(), 400);

        assert_eq!(PushError::Timeout.code(), 0);
        assert_eq!(PushError::Network("refused".to_string()).code(), 0);
    }

    #[test]
    fn test_config_error_conversion() {
        let err: PushError = firepush_config::ConfigError::KeyNotFound("fcm".to_string()).into();
        assert!(matches!(err, PushError::Config(_)));
        assert!(err.to_string().contains("fcm"));
    }
}
