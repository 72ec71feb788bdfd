//! Integration tests for the Google client over the mock transport.

use integrations_llm_adapter::client::{ChatModel, ChatModelExt, GoogleChat};
use integrations_llm_adapter::config::{GenerationOptions, GoogleConfig, Platform};
use integrations_llm_adapter::error::{AdapterError, TransportError};
use integrations_llm_adapter::mocks::MockHttpTransport;
use integrations_llm_adapter::streaming::StreamAggregator;
use integrations_llm_adapter::structured::{StructuredOutputConfig, StructuredResult};
use integrations_llm_adapter::types::{ChatRequest, ContentPart, FinishReason, Message, Usage};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, PartialEq, Deserialize)]
struct Calculation {
    operation: String,
    number1: f64,
    number2: f64,
}

fn create_client() -> (GoogleChat, Arc<MockHttpTransport>) {
    let transport = Arc::new(MockHttpTransport::new());
    let config = GoogleConfig::builder()
        .api_key(SecretString::new("test-api-key".to_string()))
        .model("gemini-1.5-flash")
        .options(GenerationOptions::default().with_max_tokens(256).with_temperature(0.2))
        .build()
        .unwrap();
    (GoogleChat::with_transport(config, transport.clone()), transport)
}

fn calculator_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "operation": {"type": "string", "enum": ["add", "subtract", "multiply", "divide"]},
            "number1": {"type": "number"},
            "number2": {"type": "number"}
        },
        "required": ["operation", "number1", "number2"]
    })
}

fn function_call_response(args: Value) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{"functionCall": {"name": "calculator", "args": args}}]
            },
            "finishReason": "STOP",
            "index": 0
        }],
        "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 12, "totalTokenCount": 52}
    })
}

#[tokio::test]
async fn test_structured_output_with_raw() {
    // Arrange
    let (client, transport) = create_client();
    transport.enqueue_json(
        200,
        &function_call_response(json!({"operation": "add", "number1": 2, "number2": 2})),
    );
    let chat = client
        .with_structured_output(
            calculator_schema(),
            StructuredOutputConfig::function_calling("calculator").with_include_raw(true),
        )
        .unwrap();

    // Act
    let result: StructuredResult<Calculation> = chat
        .invoke(ChatRequest::from_prompt("What is 2 + 2?"))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        result.parsed,
        Calculation {
            operation: "add".to_string(),
            number1: 2.0,
            number2: 2.0,
        }
    );
    let raw = result.raw.unwrap();
    assert_eq!(raw.tool_calls.len(), 1);
    assert_eq!(raw.tool_calls[0].name, "calculator");
    assert!(raw.tool_calls[0].id.as_deref().unwrap().starts_with("call_"));
    assert_eq!(raw.usage, Some(Usage::new(40, 12)));

    transport.verify_url(0, "/v1beta/models/gemini-1.5-flash:generateContent");
    transport.verify_header(0, "x-goog-api-key", "test-api-key");
    let body = transport.last_request().unwrap().body_json().unwrap();
    assert_eq!(
        body["toolConfig"],
        json!({"functionCallingConfig": {"mode": "ANY", "allowedFunctionNames": ["calculator"]}})
    );
    assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "calculator");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
}

#[tokio::test]
async fn test_json_mode_sets_response_mime_type() {
    // Arrange
    let (client, transport) = create_client();
    transport.enqueue_json(
        200,
        &json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"operation\": \"divide\", \"number1\": 8, \"number2\": 2}"}]},
                "finishReason": "STOP"
            }]
        }),
    );
    let chat = client
        .with_structured_output(calculator_schema(), StructuredOutputConfig::json_mode())
        .unwrap();

    // Act
    let result: StructuredResult<Calculation> = chat
        .invoke(ChatRequest::from_prompt("What is 8 / 2?"))
        .await
        .unwrap();

    // Assert
    assert_eq!(result.parsed.operation, "divide");
    let body = transport.last_request().unwrap().body_json().unwrap();
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert!(body.get("tools").is_none());
}

#[tokio::test]
async fn test_schema_violation_from_provider_args() {
    let (client, transport) = create_client();
    transport.enqueue_json(
        200,
        &function_call_response(json!({"operation": "add", "number1": "2", "number2": 2})),
    );
    let chat = client
        .with_structured_output(
            calculator_schema(),
            StructuredOutputConfig::function_calling("calculator"),
        )
        .unwrap();

    let error = chat
        .invoke::<Value>(ChatRequest::from_prompt("What is 2 + 2?"))
        .await
        .unwrap_err();

    assert_eq!(error.failing_paths(), vec!["/number1"]);
}

#[tokio::test]
async fn test_streamed_array_split_mid_object() {
    // Arrange
    let (client, transport) = create_client();
    transport.enqueue_stream([
        "[{\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"The answer\"}]}}]}",
        ",\r\n{\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \" is 4",
        ".\"}]}, \"finishReason\": \"STOP\"}],",
        " \"usageMetadata\": {\"promptTokenCount\": 6, \"candidatesTokenCount\": 5, \"totalTokenCount\": 11}}\r\n]",
    ]);

    // Act
    let stream = client
        .stream(ChatRequest::from_prompt("What is 2 + 2?"))
        .await
        .unwrap();
    let message = StreamAggregator::aggregate(stream).await.unwrap();

    // Assert
    assert_eq!(message.content, "The answer is 4.");
    assert_eq!(message.finish_reason, Some(FinishReason::Stop));
    assert_eq!(message.usage, Some(Usage::new(6, 5)));
    transport.verify_url(0, ":streamGenerateContent");
}

#[tokio::test]
async fn test_streamed_function_calls_get_sequential_indices() {
    let (client, transport) = create_client();
    transport.enqueue_stream([
        r#"[{"candidates": [{"content": {"parts": [{"functionCall": {"name": "lookup", "args": {"q": "a"}}}]}}]},"#,
        r#"{"candidates": [{"content": {"parts": [{"functionCall": {"name": "lookup", "args": {"q": "b"}}}]}}]}]"#,
    ]);

    let stream = client.stream(ChatRequest::from_prompt("Look up a and b")).await.unwrap();
    let message = StreamAggregator::aggregate(stream).await.unwrap();

    let indices: Vec<_> = message.tool_calls.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(message.tool_calls[1].args, r#"{"q":"b"}"#);
}

#[tokio::test]
async fn test_error_status_surfaces_as_http_error() {
    // Arrange
    let (client, transport) = create_client();
    transport.enqueue_json(
        403,
        &json!({"error": {"code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED"}}),
    );

    // Act
    let error = client.call("Hello").await.unwrap_err();

    // Assert
    match error {
        AdapterError::Transport(TransportError::Http { status, message, .. }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "API key not valid.");
        }
        other => panic!("expected an HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blocked_prompt_finishes_with_content_filter() {
    let (client, transport) = create_client();
    transport.enqueue_json(200, &json!({"promptFeedback": {"blockReason": "SAFETY"}}));

    let message = client.invoke(ChatRequest::from_prompt("...")).await.unwrap();

    assert_eq!(message.content, "");
    assert_eq!(message.finish_reason, Some(FinishReason::ContentFilter));
}

#[tokio::test]
async fn test_images_map_to_inline_and_file_data() {
    // Arrange
    let (client, transport) = create_client();
    transport.enqueue_json(
        200,
        &json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "Two images."}]}}]}),
    );
    let request = ChatRequest::new(vec![Message::human(vec![
        ContentPart::text("Compare these."),
        ContentPart::image_base64("image/jpeg", "/9j/4AAQSkZJRg=="),
        ContentPart::image_url("gs://bucket/photo.png"),
    ])]);

    // Act
    client.invoke(request).await.unwrap();

    // Assert
    let body = transport.last_request().unwrap().body_json().unwrap();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0], json!({"text": "Compare these."}));
    assert_eq!(
        parts[1],
        json!({"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQSkZJRg=="}})
    );
    assert_eq!(parts[2]["fileData"]["fileUri"], "gs://bucket/photo.png");
}

#[tokio::test]
async fn test_vertex_platform_uses_bearer_token() {
    let transport = Arc::new(MockHttpTransport::new());
    let config = GoogleConfig::builder()
        .platform(Platform::Gcp)
        .access_token(SecretString::new("ya29.token".to_string()))
        .project("acme")
        .build()
        .unwrap();
    let client = GoogleChat::with_transport(config, transport.clone());
    transport.enqueue_json(
        200,
        &json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "hi"}]}}]}),
    );

    assert_eq!(client.call("hi").await.unwrap(), "hi");
    transport.verify_url(
        0,
        "https://us-central1-aiplatform.googleapis.com/v1/projects/acme/locations/us-central1/publishers/google/models/gemini-pro:generateContent",
    );
    transport.verify_header(0, "authorization", "Bearer ya29.token");
}
