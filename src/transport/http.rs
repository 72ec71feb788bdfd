//! Core HTTP transport abstractions.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use crate::error::TransportError;

/// Raw response body stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A JSON `POST` request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Serialized JSON body.
    pub body: Bytes,
}

impl HttpRequest {
    /// Serializes `body` as the JSON payload for `url`.
    pub fn json<B: Serialize>(url: impl Into<String>, body: &B) -> Result<Self, TransportError> {
        let body = serde_json::to_vec(body).map_err(|e| TransportError::Decode {
            message: format!("Failed to serialize request body: {}", e),
            body: String::new(),
        })?;

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Ok(Self {
            url: url.into(),
            headers,
            body: Bytes::from(body),
        })
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a header value by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The body as JSON, for inspection in tests and logs.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// A successful HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, names lowercased.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

/// HTTP transport abstraction for testability.
///
/// Implementations return [`TransportError::Http`] for non-2xx statuses, so
/// callers only ever see successful responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and buffers the whole response.
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Sends a request and returns the response body as a byte stream.
    async fn post_stream(&self, request: HttpRequest) -> Result<ByteStream, TransportError>;
}

/// Maps a non-success response to a [`TransportError::Http`].
///
/// Pulls a readable message out of the common provider error envelopes
/// (`{"message": ...}`, `{"error": {"message": ...}}`, `{"detail": ...}`).
pub fn http_error(status: u16, headers: &HashMap<String, String>, body: &[u8]) -> TransportError {
    let body = String::from_utf8_lossy(body).into_owned();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .or_else(|| json.get("message"))
                .or_else(|| json.get("detail"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| default_status_message(status).to_string());

    let retry_after = headers
        .get("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    TransportError::Http {
        status,
        message,
        body,
        retry_after,
    }
}

fn default_status_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Authentication failed",
        403 => "Permission denied",
        404 => "Not found",
        429 => "Rate limit exceeded",
        500..=599 => "Provider server error",
        _ => "Unexpected status",
    }
}
