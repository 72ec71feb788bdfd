//! Client configuration.
//!
//! Both providers are configured through builders; credentials are held as
//! [`SecretString`](secrecy::SecretString) so they never show up in `Debug`
//! output or logs.

mod google;
mod mistral;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigurationError;

pub use google::{GoogleConfig, GoogleConfigBuilder, Platform};
pub use mistral::{MistralConfig, MistralConfigBuilder};

/// Default request timeout (120 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Sampling options shared by every provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling probability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets top_p.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets max_tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Parses a base URL, accepting only `http` and `https`.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ConfigurationError> {
    let url = Url::parse(raw).map_err(|_| ConfigurationError::InvalidBaseUrl {
        url: raw.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigurationError::InvalidBaseUrl {
            url: raw.to_string(),
        }),
    }
}

/// Joins `path` onto a base URL without doubling slashes.
pub(crate) fn join_url(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
