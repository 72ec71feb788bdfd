//! Subscriber installation and log-safe payload rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigurationError;

const REDACTED: &str = "***REDACTED***";

const SENSITIVE_KEYS: &[&str] = &[
    "api_key",
    "apikey",
    "key",
    "token",
    "access_token",
    "accesstoken",
    "secret",
    "password",
    "credential",
    "authorization",
    "auth",
    "x-goog-api-key",
];

/// Strings longer than this that look like base64 are truncated.
const MAX_INLINE_DATA_LEN: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warn,
    /// General information.
    #[default]
    Info,
    /// Detailed information.
    Debug,
    /// Everything, including request bodies.
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for this crate when `filter` is not set.
    pub level: LogLevel,
    /// Full `EnvFilter` directive; overrides `level` (and `RUST_LOG`).
    pub filter: Option<String>,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl LogConfig {
    fn env_filter(&self) -> Result<EnvFilter, ConfigurationError> {
        let invalid = |e: tracing_subscriber::filter::ParseError| {
            ConfigurationError::InvalidConfiguration {
                message: format!("invalid log filter: {}", e),
            }
        };

        match &self.filter {
            Some(directive) => EnvFilter::try_new(directive).map_err(invalid),
            None => EnvFilter::try_from_default_env().or_else(|_| {
                EnvFilter::try_new(format!("integrations_llm_adapter={}", self.level.as_str()))
                    .map_err(invalid)
            }),
        }
    }
}

/// Installs a global `tracing` subscriber.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), ConfigurationError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| ConfigurationError::InvalidConfiguration {
        message: format!("failed to install tracing subscriber: {}", e),
    })
}

/// Returns a copy of `value` that is safe to log.
///
/// Credentials are masked at any depth and long base64 payloads (inline
/// images) are truncated.
pub fn redact_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let redacted = if is_sensitive(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_sensitive(value)
                    };
                    (key.clone(), redacted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive).collect()),
        Value::String(text) if text.len() > MAX_INLINE_DATA_LEN && looks_like_base64(text) => {
            let head: String = text.chars().take(MAX_INLINE_DATA_LEN).collect();
            Value::String(format!("{}...[{} bytes]", head, text.len()))
        }
        other => other.clone(),
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&key.as_str())
}

fn looks_like_base64(text: &str) -> bool {
    let payload = match text.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => text,
    };
    payload
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redact_sensitive_fields() {
        let redacted = redact_sensitive(&json!({
            "api_key": "secret-key-123",
            "model": "gemini-pro",
            "headers": {"Authorization": "Bearer abc", "x-goog-api-key": "k"}
        }));

        assert_eq!(redacted["api_key"], REDACTED);
        assert_eq!(redacted["model"], "gemini-pro");
        assert_eq!(redacted["headers"]["Authorization"], REDACTED);
        assert_eq!(redacted["headers"]["x-goog-api-key"], REDACTED);
    }

    #[test]
    fn test_truncates_inline_data() {
        let data = "A".repeat(500);
        let redacted = redact_sensitive(&json!({
            "contents": [{"parts": [{"inlineData": {"mimeType": "image/png", "data": data}}]}]
        }));

        let rendered = redacted["contents"][0]["parts"][0]["inlineData"]["data"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(rendered.ends_with("...[500 bytes]"));
        assert_eq!(redacted["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
    }

    #[test]
    fn test_prose_is_left_alone() {
        let text = "What is in this image? Please describe the colors and the shapes in detail.";
        assert_eq!(redact_sensitive(&json!(text)), json!(text));
    }

    #[test]
    fn test_invalid_filter() {
        let config = LogConfig {
            filter: Some("integrations_llm_adapter=notalevel".to_string()),
            ..Default::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
