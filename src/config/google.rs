//! Google (AI Studio and Vertex AI) client configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use super::{
    join_url, parse_base_url, GenerationOptions, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_TIMEOUT_SECS,
};
use crate::error::{AdapterResult, ConfigurationError};

/// Default AI Studio base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default AI Studio API version.
pub const DEFAULT_API_VERSION: &str = "v1beta";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Default Vertex AI region.
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Google deployment target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// AI Studio, authenticated with an API key.
    Gai,
    /// Vertex AI, authenticated with a bearer access token.
    Gcp,
}

impl Platform {
    /// Short platform name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Gai => "gai",
            Platform::Gcp => "gcp",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for [`GoogleChat`](crate::client::GoogleChat).
#[derive(Clone, Debug)]
pub struct GoogleConfig {
    /// Deployment target.
    pub platform: Platform,
    /// API key (`gai`) or access token (`gcp`).
    pub credential: SecretString,
    /// Base URL for the API.
    pub base_url: Url,
    /// API version (AI Studio only).
    pub api_version: String,
    /// Model name.
    pub model: String,
    /// Vertex AI project (`gcp` only).
    pub project: Option<String>,
    /// Vertex AI region (`gcp` only).
    pub location: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Sampling options applied to every request.
    pub options: GenerationOptions,
}

impl GoogleConfig {
    /// Creates a configuration builder.
    pub fn builder() -> GoogleConfigBuilder {
        GoogleConfigBuilder::default()
    }

    /// Creates configuration from `GOOGLE_*` environment variables.
    ///
    /// `GOOGLE_ACCESS_TOKEN` selects Vertex AI; otherwise `GOOGLE_API_KEY`
    /// selects AI Studio.
    pub fn from_env() -> AdapterResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> AdapterResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(token) = lookup("GOOGLE_ACCESS_TOKEN") {
            builder = builder.access_token(SecretString::new(token));
        } else if let Some(api_key) = lookup("GOOGLE_API_KEY") {
            builder = builder.api_key(SecretString::new(api_key));
        }
        if let Some(project) = lookup("GOOGLE_CLOUD_PROJECT") {
            builder = builder.project(project);
        }
        if let Some(location) = lookup("GOOGLE_CLOUD_LOCATION") {
            builder = builder.location(location);
        }
        if let Some(base_url) = lookup("GOOGLE_BASE_URL") {
            builder = builder.base_url(&base_url)?;
        }
        if let Some(model) = lookup("GOOGLE_MODEL") {
            builder = builder.model(model);
        }

        builder.build()
    }

    /// URL of a model method such as `generateContent`.
    pub fn method_url(&self, method: &str) -> String {
        match self.platform {
            Platform::Gai => join_url(
                &self.base_url,
                &format!("{}/models/{}:{}", self.api_version, self.model, method),
            ),
            Platform::Gcp => join_url(
                &self.base_url,
                &format!(
                    "v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
                    self.project.as_deref().unwrap_or_default(),
                    self.location,
                    self.model,
                    method
                ),
            ),
        }
    }

    /// Authentication header for the configured platform.
    pub(crate) fn auth_header(&self) -> (&'static str, String) {
        match self.platform {
            Platform::Gai => ("x-goog-api-key", self.credential.expose_secret().clone()),
            Platform::Gcp => (
                "authorization",
                format!("Bearer {}", self.credential.expose_secret()),
            ),
        }
    }
}

/// Builder for [`GoogleConfig`].
#[derive(Default)]
pub struct GoogleConfigBuilder {
    platform: Option<Platform>,
    api_key: Option<SecretString>,
    access_token: Option<SecretString>,
    base_url: Option<Url>,
    api_version: Option<String>,
    model: Option<String>,
    project: Option<String>,
    location: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    options: GenerationOptions,
}

impl GoogleConfigBuilder {
    /// Forces the platform instead of inferring it from the credential.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Sets the AI Studio API key.
    pub fn api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets a pre-issued Vertex AI access token.
    pub fn access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: &str) -> AdapterResult<Self> {
        self.base_url = Some(parse_base_url(base_url)?);
        Ok(self)
    }

    /// Sets the AI Studio API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the Vertex AI project.
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Sets the Vertex AI region.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
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
    pub fn build(self) -> AdapterResult<GoogleConfig> {
        let platform = self.platform.unwrap_or(if self.access_token.is_some() {
            Platform::Gcp
        } else {
            Platform::Gai
        });
        let location = self.location.unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let (credential, default_base) = match platform {
            Platform::Gai => (
                self.api_key.ok_or_else(|| ConfigurationError::MissingCredential {
                    name: "GOOGLE_API_KEY".to_string(),
                })?,
                DEFAULT_BASE_URL.to_string(),
            ),
            Platform::Gcp => {
                let token = self.access_token.ok_or_else(|| {
                    ConfigurationError::MissingCredential {
                        name: "GOOGLE_ACCESS_TOKEN".to_string(),
                    }
                })?;
                if self.project.is_none() {
                    return Err(ConfigurationError::InvalidConfiguration {
                        message: "GOOGLE_CLOUD_PROJECT is required for the gcp platform"
                            .to_string(),
                    }
                    .into());
                }
                (token, format!("https://{}-aiplatform.googleapis.com", location))
            }
        };

        let base_url = match self.base_url {
            Some(url) => url,
            None => parse_base_url(&default_base)?,
        };

        Ok(GoogleConfig {
            platform,
            credential,
            base_url,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            project: self.project,
            location,
            timeout: self.timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            connect_timeout: self
                .connect_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            options: self.options,
        })
    }
}
