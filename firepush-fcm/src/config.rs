//! FCM client configuration.
//!
//! Resolution order: the host application's [`ConfigManager`] when one is
//! given, otherwise the bundled `config/firepush.toml`. Either way the `fcm`
//! section must exist, and `FIREPUSH_FCM_*` environment variables are laid
//! over it before deserializing.

use firepush_config::{ConfigError, ConfigManager, ConfigValidator, EnvLoader, FileFormat, Validate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::{PushError, Result};

/// Configuration section read by the FCM client.
pub const SERVICE_SECTION: &str = "fcm";

/// Prefix of the environment variables overriding the `fcm` section.
pub const ENV_PREFIX: &str = "FIREPUSH_FCM";

/// Lifetime of an OAuth2 access token minted from a service account.
pub const TOKEN_LIFETIME_SECS: u64 = 3600;

/// Default number of seconds an access token is reused.
pub const DEFAULT_TOKEN_CACHE_TIME: u64 = 3500;

const BUNDLED_CONFIG: &str = include_str!("../config/firepush.toml");

/// Android delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Normal priority.
    #[default]
    Normal,
    /// High priority (may wake device).
    High,
}

/// Options for the underlying HTTP client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpOptions {
    /// Whole-request timeout in seconds. `None` keeps the client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Connect timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    /// `User-Agent` header value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Report non-2xx responses as failed sends instead of completed exchanges.
    #[serde(default)]
    pub http_errors: bool,
}

impl HttpOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_secs)
    }
}

/// FCM configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcmConfig {
    /// Configured delivery priority. Readable through property lookup;
    /// messages are sent without it.
    #[serde(default)]
    pub priority: Priority,
    /// Path of the service-account JSON key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<PathBuf>,
    /// Ask FCM to validate messages without delivering them.
    #[serde(default)]
    pub dry_run: bool,
    /// Firebase project id used in the send URL and the token cache key.
    pub firebase_project_id: String,
    /// Seconds an access token stays cached.
    #[serde(default = "default_token_cache_time")]
    pub token_cache_time: u64,
    /// HTTP client options.
    #[serde(default)]
    pub http: HttpOptions,
}

fn default_token_cache_time() -> u64 {
    DEFAULT_TOKEN_CACHE_TIME
}

impl FcmConfig {
    /// Create a config for a project and key file, everything else defaulted.
    pub fn new(project_id: impl Into<String>, certificate: impl Into<PathBuf>) -> Self {
        Self {
            priority: Priority::Normal,
            certificate: Some(certificate.into()),
            dry_run: false,
            firebase_project_id: project_id.into(),
            token_cache_time: DEFAULT_TOKEN_CACHE_TIME,
            http: HttpOptions::default(),
        }
    }

    /// The configuration shipped with this crate.
    pub fn bundled_defaults() -> Result<ConfigManager> {
        Ok(ConfigManager::from_source(BUNDLED_CONFIG, FileFormat::Toml)?)
    }

    /// Resolve from the host configuration, or from the bundled defaults
    /// when the host provides none.
    pub fn resolve(host: Option<&ConfigManager>) -> Result<Self> {
        match host {
            Some(manager) => Self::from_manager(manager, Some(ENV_PREFIX)),
            None => Self::from_manager(&Self::bundled_defaults()?, Some(ENV_PREFIX)),
        }
    }

    /// Read the `fcm` section of `manager`, overlaying environment
    /// variables that start with `env_prefix`.
    pub fn from_manager(manager: &ConfigManager, env_prefix: Option<&str>) -> Result<Self> {
        let mut section = manager.section(SERVICE_SECTION).map_err(|e| match e {
            ConfigError::KeyNotFound(_) => PushError::Config(format!(
                "Service '{}' missing in configuration",
                SERVICE_SECTION
            )),
            other => other.into(),
        })?;

        if let Some(prefix) = env_prefix {
            EnvLoader::new(Some(prefix.to_string())).overlay(&mut section)?;
        }

        Self::from_section(section)
    }

    fn from_section(section: Map<String, Value>) -> Result<Self> {
        let config: Self = serde_json::from_value(Value::Object(section))
            .map_err(|e| PushError::Config(format!("{}: {}", SERVICE_SECTION, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the given keys, keeping every other value.
    pub fn apply_overrides(&mut self, overrides: Map<String, Value>) -> Result<()> {
        let mut current = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            current.insert(key, value);
        }
        *self = Self::from_section(current)?;
        Ok(())
    }

    /// How long a minted access token is reused.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_cache_time)
    }
}

impl Validate for FcmConfig {
    fn validate(&self) -> firepush_config::Result<()> {
        ConfigValidator::not_empty(&self.firebase_project_id, "firebase_project_id")?;
        ConfigValidator::in_range(
            self.token_cache_time,
            1,
            TOKEN_LIFETIME_SECS,
            "token_cache_time",
        )?;

        if self.token_cache_time > DEFAULT_TOKEN_CACHE_TIME {
            warn!(
                token_cache_time = self.token_cache_time,
                "token_cache_time leaves little margin before the access token expires"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bundled_defaults() {
        let config = FcmConfig::from_manager(&FcmConfig::bundled_defaults().unwrap(), None).unwrap();

        assert_eq!(config.priority, Priority::Normal);
        assert!(!config.dry_run);
        assert_eq!(config.firebase_project_id, "FIREBASE_PROJECT_ID");
        assert_eq!(config.token_cache_time, 3500);
        assert_eq!(
            config.certificate,
            Some(PathBuf::from("fcmCertificates/fcm-admin-sdk.json"))
        );
        assert!(!config.http.http_errors);
    }

    #[test]
    fn test_host_config_wins() {
        let host = ConfigManager::new();
        host.set(
            "fcm",
            json!({
                "firebase_project_id": "host-app",
                "certificate": "/etc/firepush/sa.json",
                "priority": "high",
            }),
        )
        .unwrap();

        let config = FcmConfig::resolve(Some(&host)).unwrap();
        assert_eq!(config.firebase_project_id, "host-app");
        assert_eq!(config.priority, Priority::High);
        assert_eq!(config.token_cache_time, DEFAULT_TOKEN_CACHE_TIME);
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let host = ConfigManager::new();
        host.set("apns", json!({})).unwrap();

        let err = FcmConfig::resolve(Some(&host)).unwrap_err();
        assert!(matches!(err, PushError::Config(ref msg) if msg.contains("'fcm'")));
    }

    #[test]
    fn test_cache_time_beyond_token_lifetime_rejected() {
        let host = ConfigManager::new();
        host.set(
            "fcm",
            json!({"firebase_project_id": "p", "token_cache_time": 7200}),
        )
        .unwrap();

        assert!(matches!(
            FcmConfig::from_manager(&host, None),
            Err(PushError::Config(_))
        ));
    }

    #[test]
    fn test_env_overlay() {
        let host = ConfigManager::new();
        host.set("fcm", json!({"firebase_project_id": "file", "dry_run": false}))
            .unwrap();

        unsafe {
            std::env::set_var("FIREPUSH_FCM_UNIT_FIREBASE_PROJECT_ID", "from-env");
            std::env::set_var("FIREPUSH_FCM_UNIT_DRY_RUN", "true");
        }
        let config = FcmConfig::from_manager(&host, Some("FIREPUSH_FCM_UNIT")).unwrap();
        unsafe {
            std::env::remove_var("FIREPUSH_FCM_UNIT_FIREBASE_PROJECT_ID");
            std::env::remove_var("FIREPUSH_FCM_UNIT_DRY_RUN");
        }

        assert_eq!(config.firebase_project_id, "from-env");
        assert!(config.dry_run);
    }

    #[test]
    fn test_apply_overrides_replaces_only_given_keys() {
        let mut config = FcmConfig::new("demo", "/keys/sa.json");
        let overrides = json!({"dry_run": true, "priority": "high"})
            .as_object()
            .cloned()
            .unwrap();

        config.apply_overrides(overrides).unwrap();

        assert!(config.dry_run);
        assert_eq!(config.priority, Priority::High);
        assert_eq!(config.firebase_project_id, "demo");
        assert_eq!(config.certificate, Some(PathBuf::from("/keys/sa.json")));
    }

    #[test]
    fn test_apply_overrides_rejects_invalid_values() {
        let mut config = FcmConfig::new("demo", "/keys/sa.json");
        let overrides = json!({"priority": "urgent"}).as_object().cloned().unwrap();

        assert!(config.apply_overrides(overrides).is_err());
        assert_eq!(config.priority, Priority::Normal);
    }

    #[test]
    fn test_env_overlay_fills_keys_host_left_out() {
        let host = ConfigManager::new();
        host.set(
            "fcm",
            json!({"firebase_project_id": "host-app", "certificate": "/etc/firepush/sa.json"}),
        )
        .unwrap();

        unsafe {
            std::env::set_var("FIREPUSH_FCM_SPARSE_TOKEN_CACHE_TIME", "1800");
            std::env::set_var("FIREPUSH_FCM_SPARSE_DRY_RUN", "true");
        }
        let config = FcmConfig::from_manager(&host, Some("FIREPUSH_FCM_SPARSE"));
        unsafe {
            std::env::remove_var("FIREPUSH_FCM_SPARSE_TOKEN_CACHE_TIME");
            std::env::remove_var("FIREPUSH_FCM_SPARSE_DRY_RUN");
        }

        let config = config.unwrap();
        assert_eq!(config.token_cache_time, 1800);
        assert!(config.dry_run);
        assert_eq!(config.firebase_project_id, "host-app");
    }
}
