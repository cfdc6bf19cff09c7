//! Vendor adapters against a local HTTP double.

use std::time::Duration;

use serde_json::json;
use voice_memo::config::{AppConfig, ProviderConfig, TemplateConfig};
use voice_memo::llm::{
    format_with, AnthropicProvider, CompletionProvider, CompletionRequest, FormatError,
    FormatterService, GoogleProvider, OpenAiProvider, ProviderError, ProviderKind, RetryPolicy,
    XaiProvider,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, route: &str, model: &str) -> ProviderConfig {
    ProviderConfig {
        api_key: "test-key".into(),
        model: model.into(),
        endpoint: format!("{}{route}", server.uri()),
        max_tokens: 512,
        timeout_secs: 5,
    }
}

fn request() -> CompletionRequest {
    CompletionRequest {
        system_prompt: "You format transcripts.".into(),
        user_prompt: "TRANSCRIPT: hello".into(),
        max_tokens: None,
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO)
}

// ---------------------------------------------------------------------------
// Request shape and parsing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anthropic_sends_key_header_and_parses_messages_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 512,
            "system": "You format transcripts.",
            "messages": [{ "role": "user", "content": "TRANSCRIPT: hello" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "claude-test-2026",
            "content": [{ "type": "text", "text": "# Notes\nbody" }],
            "usage": { "input_tokens": 11, "output_tokens": 7 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(config(&server, "/v1/messages", "claude-test"));
    let reply = provider.complete(&request()).await.unwrap();

    assert_eq!(reply.content, "# Notes\nbody");
    assert_eq!(reply.model, "claude-test-2026");
    assert_eq!(reply.usage.total(), 18);
}

#[tokio::test]
async fn openai_uses_bearer_auth_and_chat_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "You format transcripts." },
                { "role": "user", "content": "TRANSCRIPT: hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "formatted" } }],
            "usage": { "prompt_tokens": 20, "completion_tokens": 5 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(config(&server, "/v1/chat/completions", "gpt-test"));
    let reply = provider.complete(&request()).await.unwrap();

    assert_eq!(reply.content, "formatted");
    // Model falls back to the configured one when the reply omits it.
    assert_eq!(reply.model, "gpt-test");
    assert_eq!(reply.usage.input_tokens, 20);
    assert_eq!(reply.usage.output_tokens, 5);
}

#[tokio::test]
async fn xai_speaks_the_chat_completions_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "grok-test",
            "choices": [{ "message": { "content": "from grok" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = XaiProvider::new(config(&server, "/v1/chat/completions", "grok-test"));
    let reply = provider.complete(&request()).await.unwrap();

    assert_eq!(reply.content, "from grok");
    assert_eq!(reply.usage.total(), 0);
    assert_eq!(provider.provider_kind(), ProviderKind::Xai);
}

#[tokio::test]
async fn google_puts_key_in_query_and_model_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "system_instruction": { "parts": [{ "text": "You format transcripts." }] },
            "generationConfig": { "maxOutputTokens": 512 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "gemini says" }] } }],
            "usageMetadata": { "promptTokenCount": 3, "candidatesTokenCount": 4 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(config(&server, "/v1beta/models/", "gemini-test"));
    let reply = provider.complete(&request()).await.unwrap();

    assert_eq!(reply.content, "gemini says");
    assert_eq!(reply.model, "gemini-test");
    assert_eq!(reply.usage.total(), 7);
}

#[tokio::test]
async fn success_without_expected_content_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(config(&server, "/v1/chat/completions", "gpt-test"))
        .with_retry(RetryPolicy::none());
    let err = provider.complete(&request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Parse(_)));
}

// ---------------------------------------------------------------------------
// Status mapping and retry
// ---------------------------------------------------------------------------

async fn failing_anthropic(status: u16, body: serde_json::Value) -> (MockServer, ProviderError) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(3)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(config(&server, "/v1/messages", "claude-test"))
        .with_retry(fast_retry());
    let err = provider.complete(&request()).await.unwrap_err();
    (server, err)
}

#[tokio::test]
async fn unauthorized_maps_to_invalid_credential_after_full_budget() {
    let (server, err) = failing_anthropic(401, json!({})).await;
    assert_eq!(err, ProviderError::InvalidCredential);
    server.verify().await;
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limited() {
    let (_server, err) = failing_anthropic(429, json!({})).await;
    assert_eq!(err, ProviderError::RateLimited);
}

#[tokio::test]
async fn server_errors_map_to_provider_unavailable() {
    let (_server, err) = failing_anthropic(503, json!({})).await;
    assert_eq!(err, ProviderError::ProviderUnavailable);
}

#[tokio::test]
async fn other_statuses_carry_the_upstream_message() {
    let (_server, err) = failing_anthropic(
        400,
        json!({ "error": { "type": "invalid_request_error", "message": "max_tokens too large" } }),
    )
    .await;
    assert_eq!(err.to_string(), "API Error: max_tokens too large");
}

#[tokio::test]
async fn transient_failure_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "second time lucky" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(config(&server, "/v1/chat/completions", "gpt-test"))
        .with_retry(fast_retry());
    let reply = provider.complete(&request()).await.unwrap();
    assert_eq!(reply.content, "second time lucky");
}

// ---------------------------------------------------------------------------
// Formatter over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unconfigured_provider_never_hits_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config(&server, "/v1/chat/completions", "gpt-test");
    cfg.api_key = "   ".into();
    let provider = OpenAiProvider::new(cfg);

    let err = format_with(&provider, "hello", "raw", &TemplateConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err, FormatError::MissingCredential(ProviderKind::OpenAi));
    assert_eq!(
        err.to_string(),
        "OpenAI API key not configured. Please add your API key in settings."
    );
}

#[tokio::test]
async fn formatter_service_extracts_sections_from_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{
                "type": "text",
                "text": "# Weekly Sync\n\n## Summary\nShip in March.\n\n## Action Items\n- [ ] email Dana\n\n## Decisions\n- freeze scope\n"
            }],
            "usage": { "input_tokens": 100, "output_tokens": 50 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = AppConfig::default();
    app.ai.provider = "anthropic".into();
    app.ai.anthropic = config(&server, "/v1/messages", "claude-test");

    let doc = FormatterService::new()
        .with_retry(RetryPolicy::none())
        .format("we talked about march", "meeting-notes", &app)
        .await
        .unwrap();

    assert_eq!(doc.title, "Weekly Sync");
    assert_eq!(doc.summary.as_deref(), Some("Ship in March."));
    assert_eq!(doc.action_items, Some(vec!["email Dana".to_string()]));
    assert_eq!(doc.decisions, Some(vec!["freeze scope".to_string()]));
    assert_eq!(doc.metadata.provider, ProviderKind::Anthropic);
    assert_eq!(doc.metadata.template_id, "meeting-notes");
    assert_eq!(doc.metadata.tokens_used, 150);
}

#[tokio::test]
async fn unknown_provider_id_is_rejected_before_any_request() {
    let mut app = AppConfig::default();
    app.ai.provider = "mistral".into();
    let err = FormatterService::new()
        .format("text", "raw", &app)
        .await
        .unwrap_err();
    assert_eq!(err, FormatError::ProviderUnavailable("mistral".into()));
}
