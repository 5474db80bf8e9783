//! Wire-level provider tests against a local mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ikichat::credential::Credential;
use ikichat::error::{DispatchError, ErrorCategory};
use ikichat::provider::{ChatBackend, ChatRequest, Dispatcher, ProviderEndpoints};

fn key(raw: &str) -> Credential {
    Credential::new(raw).expect("non-blank key")
}

fn dispatcher_for(server: &MockServer, timeout: Duration) -> Dispatcher {
    let endpoints = ProviderEndpoints {
        gemini: Some(server.uri()),
        openai: Some(server.uri()),
        groq: Some(format!("{}/openai/v1", server.uri())),
    };
    Dispatcher::new(endpoints, timeout).expect("dispatcher")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn gemini_folds_persona_into_prompt_and_sends_key_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "gem-key"))
        .and(body_json(json!({
            "contents": [{
                "parts": [{ "text": "Instruction: You are terse.\n\nUser: Hello" }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hi." }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server, Duration::from_secs(5));
    let request = ChatRequest::new("gemini-1.5-flash", "You are terse.", "Hello");
    let reply = dispatcher.send(&request, &key("gem-key")).await.unwrap();

    assert_eq!(reply, "Hi.");
}

#[tokio::test]
async fn openai_sends_bearer_and_system_then_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "gpt-4o",
            "messages": [
                { "role": "system", "content": "You are terse." },
                { "role": "user", "content": "Hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hi.")))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server, Duration::from_secs(5));
    let request = ChatRequest::new("gpt-4o", "You are terse.", "Hello");
    let reply = dispatcher.send(&request, &key("sk-test")).await.unwrap();

    assert_eq!(reply, "Hi.");
}

#[tokio::test]
async fn other_models_go_to_groq() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("from groq")))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server, Duration::from_secs(5));
    let request = ChatRequest::new("llama3-70b-8192", "", "Hello");
    let reply = dispatcher.send(&request, &key("gsk-test")).await.unwrap();

    assert_eq!(reply, "from groq");
}

#[tokio::test]
async fn rejected_key_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server, Duration::from_secs(5));
    let err = dispatcher
        .send(&ChatRequest::new("gpt-4o", "", "Hello"), &key("wrong"))
        .await
        .unwrap_err();

    assert!(matches!(&err, DispatchError::Authentication(msg) if msg == "Incorrect API key provided"));
    assert_eq!(err.category(), ErrorCategory::Authentication);
}

#[tokio::test]
async fn status_codes_map_to_categories() {
    let cases = [
        (429, ErrorCategory::RateLimit),
        (500, ErrorCategory::Server),
        (400, ErrorCategory::Api),
    ];
    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, Duration::from_secs(5));
        let err = dispatcher
            .send(&ChatRequest::new("gemini-pro", "", "Hello"), &key("k"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), expected, "status {status}");
    }
}

#[tokio::test]
async fn missing_reply_fields_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [] } }]
        })))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server, Duration::from_secs(5));
    for model in ["gpt-4o", "gemini-1.5-flash"] {
        let err = dispatcher
            .send(&ChatRequest::new(model, "", "Hello"), &key("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MalformedResponse(_)), "{model}: {err:?}");
    }
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server, Duration::from_secs(5));
    let err = dispatcher
        .send(&ChatRequest::new("gpt-4o-mini", "", "Hello"), &key("k"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::MalformedResponse);
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("too late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server, Duration::from_millis(100));
    let err = dispatcher
        .send(&ChatRequest::new("gpt-4o", "", "Hello"), &key("k"))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Timeout(100)));
    assert_eq!(err.category(), ErrorCategory::Timeout);
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let endpoints = ProviderEndpoints {
        openai: Some("http://127.0.0.1:9".to_string()),
        ..ProviderEndpoints::default()
    };
    let dispatcher = Dispatcher::new(endpoints, Duration::from_secs(5)).unwrap();
    let err = dispatcher
        .send(&ChatRequest::new("gpt-4o", "", "Hello"), &key("k"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Network);
}
