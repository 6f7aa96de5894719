//! Integration tests for the LLM gateway backends using wiremock HTTP mocks.

use std::time::Duration;

use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wykra_core::LlmBackend;
use wykra_insight::{
    build_gateway, AnthropicGateway, ChatMessage, CompletionOptions, CompletionRequest,
    GatewayConfig, GatewayError, LlmGateway, OpenAiCompatibleGateway,
};

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "anthropic/claude-3.5-sonnet".to_owned(),
        system: "You are Wykra.".to_owned(),
        messages: vec![ChatMessage::user("- handle: \"chef_ana\"")],
        options: CompletionOptions {
            temperature: 0.0,
            max_tokens: 256,
            json_mode: true,
        },
    }
}

fn chat_reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "gen-1",
        "model": "anthropic/claude-3.5-sonnet",
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": {"role": "assistant", "content": content}
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5}
    })
}

#[tokio::test]
async fn openrouter_sends_chat_completion_and_returns_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("authorization", "Bearer or-key"))
        .and(header("x-title", "Wykra"))
        .and(header("http-referer", "https://wykra.example"))
        .and(body_partial_json(serde_json::json!({
            "model": "anthropic/claude-3.5-sonnet",
            "temperature": 0.0,
            "max_tokens": 256,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": "You are Wykra."},
                {"role": "user", "content": "- handle: \"chef_ana\""}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("{\"summary\":\"ok\"}")))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/api/v1", server.uri());
    let gateway = OpenAiCompatibleGateway::openrouter("or-key", Duration::from_secs(5), Some(&base))
        .unwrap()
        .with_site_url("https://wykra.example");

    let reply = gateway.complete(&request()).await.expect("completion");
    assert_eq!(reply, "{\"summary\":\"ok\"}");
    assert_eq!(gateway.name(), "openrouter");
}

#[tokio::test]
async fn configured_site_url_reaches_openrouter_as_referer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("x-title", "Wykra"))
        .and(header("http-referer", "https://wykra.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = build_gateway(&GatewayConfig {
        backend: LlmBackend::OpenRouter,
        api_key: "or-key".to_owned(),
        base_url: Some(format!("{}/api/v1", server.uri())),
        site_url: Some("https://wykra.example".to_owned()),
        timeout: Duration::from_secs(5),
    })
    .expect("gateway");

    gateway.complete(&request()).await.expect("completion");
}

#[tokio::test]
async fn openai_omits_openrouter_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("hello")))
        .mount(&server)
        .await;

    let base = format!("{}/v1/", server.uri());
    let gateway =
        OpenAiCompatibleGateway::openai("sk-test", Duration::from_secs(5), Some(&base)).unwrap();
    let reply = gateway.complete(&request()).await.unwrap();
    assert_eq!(reply, "hello");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(!received[0].headers.contains_key("x-title"));
}

#[tokio::test]
async fn status_codes_are_classified() {
    let cases = [
        (429, "rate"),
        (500, "server"),
        (401, "auth"),
        (404, "model"),
        (400, "bad"),
    ];

    for (status, label) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string(label))
            .mount(&server)
            .await;

        let gateway = OpenAiCompatibleGateway::openai(
            "sk-test",
            Duration::from_secs(5),
            Some(&server.uri()),
        )
        .unwrap();
        let err = gateway.complete(&request()).await.unwrap_err();

        match status {
            429 => assert!(matches!(err, GatewayError::RateLimited { .. })),
            500 => assert!(matches!(err, GatewayError::Server { status: 500, .. })),
            401 => assert!(matches!(err, GatewayError::Auth { .. })),
            404 => assert!(matches!(err, GatewayError::ModelNotFound { .. })),
            _ => assert!(matches!(err, GatewayError::BadRequest { .. })),
        }
        assert_eq!(err.is_retriable(), status == 429 || status >= 500, "{status}");
    }
}

#[tokio::test]
async fn empty_choices_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let gateway =
        OpenAiCompatibleGateway::openai("sk-test", Duration::from_secs(5), Some(&server.uri()))
            .unwrap();
    let err = gateway.complete(&request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn anthropic_sends_messages_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({
            "model": "anthropic/claude-3.5-sonnet",
            "system": "You are Wykra.",
            "max_tokens": 256,
            "messages": [{"role": "user", "content": "- handle: \"chef_ana\""}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "{\"summary\":"},
                {"type": "text", "text": "\"ok\"}"}
            ],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/v1", server.uri());
    let gateway = AnthropicGateway::new("sk-ant", Duration::from_secs(5), Some(&base)).unwrap();

    let reply = gateway.complete(&request()).await.unwrap();
    assert_eq!(reply, "{\"summary\":\"ok\"}");
}

#[tokio::test]
async fn anthropic_overloaded_is_retriable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let gateway =
        AnthropicGateway::new("sk-ant", Duration::from_secs(5), Some(&server.uri())).unwrap();
    let err = gateway.complete(&request()).await.unwrap_err();
    assert!(err.is_retriable());
}
