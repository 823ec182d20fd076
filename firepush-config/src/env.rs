// Environment variable loading

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::env;

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all environment variables, keys lowercased and stripped of the prefix
    pub fn load(&self) -> Result<HashMap<String, String>> {
        Ok(Self::filter(self.prefix.as_deref(), env::vars()))
    }

    fn filter(
        prefix: Option<&str>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> HashMap<String, String> {
        let mut config = HashMap::new();

        for (key, value) in vars {
            match prefix {
                Some(prefix) => {
                    if let Some(rest) = key.strip_prefix(prefix)
                        && let Some(trimmed) = rest.strip_prefix('_')
                        && !trimmed.is_empty()
                    {
                        config.insert(trimmed.to_lowercase(), value);
                    }
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        config
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = if let Some(ref prefix) = self.prefix {
            format!("{}_{}", prefix, key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Overlay prefixed environment variables onto an object.
    ///
    /// Values are coerced to the JSON type of the key they replace, so a
    /// numeric `token_cache_time` stays numeric. A key the object lacks is
    /// read as `true`/`false`, then as an integer, then as a string.
    /// Returns the overridden keys.
    pub fn overlay(&self, target: &mut Map<String, Value>) -> Result<Vec<String>> {
        Self::overlay_from(self.load()?, target)
    }

    fn overlay_from(
        vars: HashMap<String, String>,
        target: &mut Map<String, Value>,
    ) -> Result<Vec<String>> {
        let mut applied = Vec::new();

        for (key, raw) in vars {
            let value = coerce(&key, &raw, target.get(&key))?;
            target.insert(key.clone(), value);
            applied.push(key);
        }

        applied.sort();
        Ok(applied)
    }
}

fn coerce(key: &str, raw: &str, existing: Option<&Value>) -> Result<Value> {
    let invalid = |kind: &str| {
        ConfigError::ParseError(format!("{} must be {}, got {:?}", key, kind, raw))
    };

    match existing {
        Some(Value::Bool(_)) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(invalid("a boolean")),
        },
        Some(Value::Number(_)) => {
            if let Ok(n) = raw.parse::<i64>() {
                Ok(Value::from(n))
            } else {
                raw.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| invalid("a number"))
            }
        }
        Some(_) => Ok(Value::String(raw.to_string())),
        None => Ok(infer(raw)),
    }
}

fn infer(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
