//! Integration tests for structured-output resolution.

use futures::stream;
use integrations_llm_adapter::error::AdapterError;
use integrations_llm_adapter::structured::{
    ExtractionMethod, StructuredOutputConfig, StructuredOutputResolver, StructuredResult,
};
use integrations_llm_adapter::types::{AggregatedMessage, StreamChunk, ToolCall, ToolCallDelta};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use test_case::test_case;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Calculation {
    operation: String,
    number1: f64,
    number2: f64,
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

fn function_calling() -> StructuredOutputResolver {
    StructuredOutputResolver::from_schema(
        calculator_schema(),
        StructuredOutputConfig::function_calling("calculator"),
    )
    .unwrap()
}

fn json_mode() -> StructuredOutputResolver {
    StructuredOutputResolver::from_schema(calculator_schema(), StructuredOutputConfig::json_mode())
        .unwrap()
}

fn calculator_call(args: &str) -> AggregatedMessage {
    AggregatedMessage {
        tool_calls: vec![ToolCall::new(0, "calculator", args).with_id("call_0")],
        ..AggregatedMessage::empty()
    }
}

#[test]
fn test_no_tool_call_found() {
    // Arrange
    let message = AggregatedMessage::text("I would rather not use a tool.");

    // Act
    let result = function_calling().resolve::<Value>(&message);

    // Assert
    assert_eq!(
        result,
        Err(AdapterError::NoToolCallFound {
            expected: "calculator".to_string(),
            found: Vec::new(),
        })
    );
}

#[test]
fn test_json_mode_malformed_json() {
    let message = AggregatedMessage::text("{ not json");

    match json_mode().resolve::<Value>(&message) {
        Err(AdapterError::MalformedJson { raw, .. }) => assert_eq!(raw, "{ not json"),
        other => panic!("expected MalformedJson, got {:?}", other),
    }
}

#[test_case(function_calling() ; "function calling")]
#[test_case(json_mode() ; "json mode")]
fn test_string_number_fails_schema_validation(resolver: StructuredOutputResolver) {
    // Arrange
    let args = r#"{"operation":"add","number1":"2","number2":2}"#;
    let message = match resolver.config().method {
        ExtractionMethod::FunctionCalling => calculator_call(args),
        ExtractionMethod::JsonMode => AggregatedMessage::text(args),
    };

    // Act
    let error = resolver.resolve::<Calculation>(&message).unwrap_err();

    // Assert
    assert_eq!(error.failing_paths(), vec!["/number1"]);
    match error {
        AdapterError::SchemaValidation { violations } => {
            assert_eq!(violations[0].expected, "number");
            assert_eq!(violations[0].actual, "string");
        }
        other => panic!("expected SchemaValidation, got {:?}", other),
    }
}

#[test]
fn test_missing_required_field_is_reported_at_its_path() {
    let message = calculator_call(r#"{"operation":"add","number1":2}"#);

    let error = function_calling().resolve::<Calculation>(&message).unwrap_err();

    assert_eq!(error.failing_paths(), vec!["/number2"]);
    match error {
        AdapterError::SchemaValidation { violations } => {
            assert_eq!(violations[0].expected, "number");
            assert_eq!(violations[0].actual, "missing");
        }
        other => panic!("expected SchemaValidation, got {:?}", other),
    }
}

#[test]
fn test_resolution_is_idempotent() {
    // Arrange
    let resolver = StructuredOutputResolver::from_schema(
        calculator_schema(),
        StructuredOutputConfig::function_calling("calculator").with_include_raw(true),
    )
    .unwrap();
    let message = calculator_call(r#"{"operation":"divide","number1":9,"number2":3}"#);

    // Act
    let first: StructuredResult<Calculation> = resolver.resolve(&message).unwrap();
    let second: StructuredResult<Calculation> = resolver.resolve(&message).unwrap();

    // Assert
    assert_eq!(first, second);
    assert_eq!(first.raw.as_ref(), Some(&message));
}

#[test]
fn test_include_raw_result_shape() {
    let resolver = StructuredOutputResolver::from_schema(
        calculator_schema(),
        StructuredOutputConfig::function_calling("calculator").with_include_raw(true),
    )
    .unwrap();
    let message = calculator_call(r#"{"operation":"add","number1":2,"number2":2}"#);

    let result: StructuredResult<Value> = resolver.resolve(&message).unwrap();
    let rendered = serde_json::to_value(&result).unwrap();

    assert_eq!(rendered["parsed"], json!({"operation": "add", "number1": 2, "number2": 2}));
    assert_eq!(rendered["raw"]["toolCalls"][0]["name"], "calculator");
}

#[tokio::test]
async fn test_resolve_stream_reassembles_arguments() {
    // Arrange
    let chunks = vec![
        Ok(StreamChunk::text("Let me work that out.")),
        Ok(StreamChunk::tool_call(
            ToolCallDelta::new(0).with_id("call_9").with_name("calculator"),
        )),
        Ok(StreamChunk::tool_call(
            ToolCallDelta::new(0).with_args(r#"{"operation":"mul"#),
        )),
        Ok(StreamChunk::tool_call(
            ToolCallDelta::new(0).with_args(r#"tiply","number1":6,"number2":7}"#),
        )),
    ];

    // Act
    let result: StructuredResult<Calculation> = function_calling()
        .resolve_stream(stream::iter(chunks))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        result.parsed,
        Calculation {
            operation: "multiply".to_string(),
            number1: 6.0,
            number2: 7.0,
        }
    );
}

#[tokio::test]
async fn test_resolve_stream_surfaces_malformed_tool_call() {
    let chunks = vec![Ok(StreamChunk::tool_call(
        ToolCallDelta::new(2).with_name("calculator").with_args(r#"{"operation":"#),
    ))];

    let error = function_calling()
        .resolve_stream::<Value, _>(stream::iter(chunks))
        .await
        .unwrap_err();

    assert!(matches!(error, AdapterError::MalformedToolCall { index: 2, .. }));
}

#[test]
fn test_config_deserializes_from_configuration_surface() {
    // Arrange
    let raw = json!({"name": "calculator", "method": "jsonMode", "includeRaw": true});

    // Act
    let config: StructuredOutputConfig = serde_json::from_value(raw).unwrap();
    let defaults: StructuredOutputConfig = serde_json::from_value(json!({})).unwrap();

    // Assert
    assert_eq!(config.name, "calculator");
    assert_eq!(config.method, ExtractionMethod::JsonMode);
    assert!(config.include_raw);
    assert_eq!(defaults.name, "extract");
    assert_eq!(defaults.method, ExtractionMethod::FunctionCalling);
    assert!(!defaults.include_raw);
}

#[test]
fn test_invalid_schema_is_a_configuration_error() {
    let result = StructuredOutputResolver::from_schema(
        json!({"type": "not-a-type"}),
        StructuredOutputConfig::default(),
    );

    assert!(matches!(result, Err(AdapterError::Configuration(_))));
}
