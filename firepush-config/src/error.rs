//! Errors raised while loading, reading and validating configuration.

use thiserror::Error;

/// Everything that can go wrong between a config source and a typed value.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No value stored under the key, or a required section is missing.
    #[error("Configuration key not found: {0}")]
    KeyNotFound(String),

    /// A file or `.env` source could not be read, or has an unknown format.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Source text is not valid TOML/JSON, or an env override has the wrong type.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A value parsed but broke a [`Validate`](crate::Validate) rule.
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A stored value does not fit the type the caller asked for.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A single variable asked for by name is unset or not unicode.
    #[error("Environment variable error: {0}")]
    EnvError(#[from] std::env::VarError),
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
