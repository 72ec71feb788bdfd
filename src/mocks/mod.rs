//! Mock implementations for testing.
//!
//! [`MockHttpTransport`] replays queued responses and records every request,
//! so clients can be exercised without a network.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::TransportError;
use crate::transport::{http_error, ByteStream, HttpRequest, HttpResponse, HttpTransport};

type StreamScript = Result<Vec<Result<Bytes, TransportError>>, TransportError>;

/// Mock HTTP transport.
///
/// # Example
///
/// ```
/// use integrations_llm_adapter::mocks::MockHttpTransport;
/// use integrations_llm_adapter::transport::{HttpRequest, HttpTransport};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let transport = MockHttpTransport::new();
/// transport.enqueue_json(200, &json!({"status": "ok"}));
///
/// let request = HttpRequest::json("https://example.test", &json!({})).unwrap();
/// let response = transport.post(request).await.unwrap();
/// assert_eq!(response.status, 200);
/// transport.verify_request_count(1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MockHttpTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    requests: Mutex<Vec<HttpRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockHttpTransport {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next [`post`](HttpTransport::post).
    pub fn enqueue_response(&self, response: Result<HttpResponse, TransportError>) {
        lock(&self.responses).push_back(response);
    }

    /// Queues a JSON response. Non-2xx statuses become
    /// [`TransportError::Http`], as with the real transport.
    pub fn enqueue_json(&self, status: u16, body: &serde_json::Value) {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let body = Bytes::from(body.to_string());

        if (200..300).contains(&status) {
            self.enqueue_response(Ok(HttpResponse {
                status,
                headers,
                body,
            }));
        } else {
            self.enqueue_response(Err(http_error(status, &headers, &body)));
        }
    }

    /// Queues an error for the next request.
    pub fn enqueue_error(&self, error: TransportError) {
        self.enqueue_response(Err(error));
    }

    /// Queues a streamed body delivered in the given pieces.
    pub fn enqueue_stream<I, B>(&self, chunks: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let chunks = chunks.into_iter().map(|chunk| Ok(chunk.into())).collect();
        lock(&self.streams).push_back(Ok(chunks));
    }

    /// Queues a streamed body that breaks off with `error` after `chunks`.
    pub fn enqueue_stream_then_error<I, B>(&self, chunks: I, error: TransportError)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let mut chunks: Vec<_> = chunks.into_iter().map(|chunk| Ok(chunk.into())).collect();
        chunks.push(Err(error));
        lock(&self.streams).push_back(Ok(chunks));
    }

    /// Queues an error for the next streaming request.
    pub fn enqueue_stream_error(&self, error: TransportError) {
        lock(&self.streams).push_back(Err(error));
    }

    /// All recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Asserts that exactly `expected` requests were made.
    pub fn verify_request_count(&self, expected: usize) {
        let actual = lock(&self.requests).len();
        assert_eq!(actual, expected, "Expected {} requests, got {}", expected, actual);
    }

    /// Asserts that request `index` went to a URL containing `url_contains`.
    pub fn verify_url(&self, index: usize, url_contains: &str) {
        let requests = lock(&self.requests);
        assert!(index < requests.len(), "No request at index {}", index);
        assert!(
            requests[index].url.contains(url_contains),
            "Expected URL to contain '{}', got '{}'",
            url_contains,
            requests[index].url
        );
    }

    /// Asserts that request `index` carried `header_name: header_value`.
    pub fn verify_header(&self, index: usize, header_name: &str, header_value: &str) {
        let requests = lock(&self.requests);
        assert!(index < requests.len(), "No request at index {}", index);

        let actual = requests[index].header(header_name);
        assert_eq!(
            actual,
            Some(header_value),
            "Expected header '{}' to be '{}', got {:?}",
            header_name,
            header_value,
            actual
        );
    }

    fn record(&self, request: HttpRequest) {
        lock(&self.requests).push(request);
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.record(request);
        lock(&self.responses).pop_front().unwrap_or_else(|| {
            Err(TransportError::Connection {
                message: "No response configured in MockHttpTransport".to_string(),
            })
        })
    }

    async fn post_stream(&self, request: HttpRequest) -> Result<ByteStream, TransportError> {
        self.record(request);
        let chunks = lock(&self.streams).pop_front().unwrap_or_else(|| {
            Err(TransportError::Connection {
                message: "No streaming response configured in MockHttpTransport".to_string(),
            })
        })?;
        Ok(Box::pin(stream::iter(chunks)))
    }
}
