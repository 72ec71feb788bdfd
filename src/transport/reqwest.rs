//! Reqwest-based HTTP transport implementation.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use super::http::{http_error, ByteStream, HttpRequest, HttpResponse, HttpTransport};
use crate::error::TransportError;

/// Reqwest-based HTTP transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given timeouts.
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Connection {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    fn convert_headers(headers: &HashMap<String, String>) -> reqwest::header::HeaderMap {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
                reqwest::header::HeaderValue::from_str(value),
            ) {
                header_map.insert(name, val);
            }
        }
        header_map
    }

    fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect()
    }

    async fn send(&self, request: HttpRequest) -> Result<reqwest::Response, TransportError> {
        tracing::debug!(url = %request.url, body_len = request.body.len(), "sending request");

        let response = self
            .client
            .post(&request.url)
            .headers(Self::convert_headers(&request.headers))
            .body(request.body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response);
        }

        let headers = Self::extract_headers(response.headers());
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let error = http_error(status, &headers, &body);
        tracing::warn!(status, error = %error, "provider returned an error status");
        Err(error)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connection {
            message: e.to_string(),
        }
    } else {
        TransportError::Stream {
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.send(request).await?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn post_stream(&self, request: HttpRequest) -> Result<ByteStream, TransportError> {
        let response = self.send(request).await?;
        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(map_reqwest_error)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_transport_creation() {
        let transport = ReqwestTransport::new(Duration::from_secs(30), Duration::from_secs(10));
        assert!(transport.is_ok());
    }

    #[test]
    fn test_header_conversion_skips_invalid_names() {
        let mut headers = HashMap::new();
        headers.insert("x-goog-api-key".to_string(), "k".to_string());
        headers.insert("bad header".to_string(), "v".to_string());

        let map = ReqwestTransport::convert_headers(&headers);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x-goog-api-key").and_then(|v| v.to_str().ok()), Some("k"));
    }
}
