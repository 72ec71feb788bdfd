//! Mistral client configuration.

use secrecy::SecretString;
use std::time::Duration;
use url::Url;

use super::{
    join_url, parse_base_url, GenerationOptions, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_TIMEOUT_SECS,
};
use crate::error::{AdapterResult, ConfigurationError};

/// Default Mistral API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "mistral-large-latest";

/// Configuration for [`MistralChat`](crate::client::MistralChat).
#[derive(Clone, Debug)]
pub struct MistralConfig {
    /// API key.
    pub api_key: SecretString,
    /// Base URL for the API.
    pub base_url: Url,
    /// Model ID.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Sampling options applied to every request.
    pub options: GenerationOptions,
}

impl MistralConfig {
    /// Creates a configuration builder.
    pub fn builder() -> MistralConfigBuilder {
        MistralConfigBuilder::default()
    }

    /// Creates configuration from `MISTRAL_*` environment variables.
    pub fn from_env() -> AdapterResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> AdapterResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(api_key) = lookup("MISTRAL_API_KEY") {
            builder = builder.api_key(SecretString::new(api_key));
        }
        if let Some(base_url) = lookup("MISTRAL_BASE_URL") {
            builder = builder.base_url(&base_url)?;
        }
        if let Some(model) = lookup("MISTRAL_MODEL") {
            builder = builder.model(model);
        }

        builder.build()
    }

    /// Chat completions endpoint.
    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, "v1/chat/completions")
    }
}

/// Builder for [`MistralConfig`].
#[derive(Default)]
pub struct MistralConfigBuilder {
    api_key: Option<SecretString>,
    base_url: Option<Url>,
    model: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    options: GenerationOptions,
}

impl MistralConfigBuilder {
    /// Sets the API key.
    pub fn api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: &str) -> AdapterResult<Self> {
        self.base_url = Some(parse_base_url(base_url)?);
        Ok(self)
    }

    /// Sets the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the sampling options.
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> AdapterResult<MistralConfig> {
        let api_key = self.api_key.ok_or_else(|| ConfigurationError::MissingCredential {
            name: "MISTRAL_API_KEY".to_string(),
        })?;

        let base_url = match self.base_url {
            Some(url) => url,
            None => parse_base_url(DEFAULT_BASE_URL)?,
        };

        Ok(MistralConfig {
            api_key,
            base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: self.timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            connect_timeout: self
                .connect_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = MistralConfig::builder()
            .api_key(SecretString::new("test-key".into()))
            .build()
            .unwrap();

        assert_eq!(config.chat_url(), "https://api.mistral.ai/v1/chat/completions");
        assert_eq!(config.model, "mistral-large-latest");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.api_key.expose_secret(), "test-key");
    }

    #[test]
    fn test_missing_api_key() {
        assert_eq!(
            MistralConfig::builder().build().unwrap_err(),
            AdapterError::Configuration(ConfigurationError::MissingCredential {
                name: "MISTRAL_API_KEY".to_string()
            })
        );
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("MISTRAL_API_KEY", "k"),
            ("MISTRAL_BASE_URL", "http://localhost:8080/"),
            ("MISTRAL_MODEL", "open-mistral-nemo"),
        ]
        .into_iter()
        .collect();

        let config = MistralConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.chat_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.model, "open-mistral-nemo");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = MistralConfig::builder().base_url("mistral.ai");
        assert!(matches!(
            result,
            Err(AdapterError::Configuration(ConfigurationError::InvalidBaseUrl { .. }))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = MistralConfig::builder()
            .api_key(SecretString::new("super-secret".into()))
            .build()
            .unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
