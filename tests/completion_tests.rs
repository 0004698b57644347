//! Integration tests for the completion client against a mock API.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mailscribe::completion::{build_payload, reply_messages, CompletionClient, SamplingConfig};
use mailscribe::error::ScribeError;
use mailscribe::model::chat::{ChatMessage, CompletionPayload};

fn success(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    }))
}

fn unsupported_value() -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": {
            "message": "Unsupported value: 'temperature' does not support 0.7",
            "type": "invalid_request_error",
            "param": "temperature",
            "code": "unsupported_value"
        }
    }))
}

fn payload(model: &str) -> CompletionPayload {
    build_payload(
        model,
        vec![ChatMessage::system("s"), ChatMessage::user("u")],
        &SamplingConfig {
            temperature: Some(0.7),
            top_p: Some(1.0),
            max_tokens: Some(128),
            presence_penalty: Some(0.0),
            frequency_penalty: Some(0.0),
        },
    )
}

async fn client(server: &MockServer) -> CompletionClient {
    CompletionClient::new(format!("{}/v1", server.uri()), "sk-test", None).unwrap()
}

async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

// ─── Happy path ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_complete_returns_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(success("  Sounds good!\n"))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server).await.complete(&payload("gpt-4o-mini")).await.unwrap();
    assert_eq!(text, "Sounds good!");

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies[0]["model"], "gpt-4o-mini");
    assert_eq!(bodies[0]["temperature"], 0.7);
    assert_eq!(bodies[0]["messages"][0]["role"], "system");
    assert_eq!(bodies[0]["messages"][1]["content"], "u");
}

#[tokio::test]
async fn test_restricted_model_payload_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(success("ok"))
        .mount(&server)
        .await;

    let messages = reply_messages(None, "Hello");
    let payload = build_payload(
        "gpt-5",
        messages,
        &SamplingConfig {
            temperature: Some(1.0),
            top_p: Some(1.0),
            max_tokens: Some(64),
            presence_penalty: Some(0.5),
            frequency_penalty: Some(0.5),
        },
    );
    client(&server).await.complete(&payload).await.unwrap();

    let body = &request_bodies(&server).await[0];
    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["max_tokens", "messages", "model"]);
}

// ─── Degrade and retry ──────────────────────────────────────────────

#[tokio::test]
async fn test_unsupported_value_retries_once_with_minimal_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(unsupported_value())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(success("retried"))
        .mount(&server)
        .await;

    let text = client(&server).await.complete(&payload("o-series")).await.unwrap();
    assert_eq!(text, "retried");

    let bodies = request_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["temperature"], 0.7);

    let retry = bodies[1].as_object().unwrap();
    assert!(retry.get("temperature").is_none());
    assert!(retry.get("top_p").is_none());
    assert!(retry.get("presence_penalty").is_none());
    assert!(retry.get("frequency_penalty").is_none());
    assert_eq!(retry["max_tokens"], 128);
    assert_eq!(retry["model"], "o-series");
    assert_eq!(retry["messages"], bodies[0]["messages"]);
}

#[tokio::test]
async fn test_second_failure_is_remote_call_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(unsupported_value())
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .complete(&payload("o-series"))
        .await
        .unwrap_err();
    match err {
        ScribeError::RemoteCall { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("unsupported_value"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": "context_length_exceeded", "param": "messages" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .complete(&payload("gpt-4o"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScribeError::RemoteCall { status: 400, .. }));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .complete(&payload("gpt-4o"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "API error 503: overloaded");
}

// ─── Empty responses and credentials ────────────────────────────────

#[tokio::test]
async fn test_blank_choice_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .complete(&payload("gpt-4o"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScribeError::EmptyResponse));
}

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(success("never"))
        .expect(0)
        .mount(&server)
        .await;

    let client = CompletionClient::new(format!("{}/v1", server.uri()), "", None).unwrap();
    let err = client.complete(&payload("gpt-4o")).await.unwrap_err();
    assert!(matches!(err, ScribeError::Configuration(_)));
    assert!(request_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn test_check_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    client(&server).await.check_credentials().await.unwrap();

    let bad = CompletionClient::new(format!("{}/v1", server.uri()), "sk-wrong", None).unwrap();
    let err = bad.check_credentials().await.unwrap_err();
    assert!(matches!(err, ScribeError::RemoteCall { status: 404, .. }));
}
