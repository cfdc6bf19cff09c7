//! OpenAI chat-completions adapter.
//!
//! Bearer auth, system + user messages, content at
//! `choices[0].message.content`.  The request/response handling lives in
//! [`chat_completion`] so other vendors speaking the same wire format reuse
//! it unchanged.

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::llm::provider::{
    http_client, send_json, CompletionProvider, CompletionRequest, CompletionResponse,
    ProviderError, ProviderKind, Usage,
};
use crate::llm::RetryPolicy;

/// One chat-completions round trip, without retry.
pub(crate) async fn chat_completion(
    client: &reqwest::Client,
    config: &ProviderConfig,
    request: &CompletionRequest,
) -> Result<CompletionResponse, ProviderError> {
    let body = serde_json::json!({
        "model": config.model,
        "max_tokens": request.max_tokens.unwrap_or(config.max_tokens),
        "messages": [
            { "role": "system", "content": request.system_prompt },
            { "role": "user",   "content": request.user_prompt   }
        ]
    });

    let req = client
        .post(&config.endpoint)
        .bearer_auth(&config.api_key)
        .json(&body);

    let json = send_json(req).await?;

    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| ProviderError::Parse("missing choices[0].message.content".into()))?
        .to_string();

    Ok(CompletionResponse {
        content,
        model: json["model"].as_str().unwrap_or(&config.model).to_string(),
        usage: Usage {
            input_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            output_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
        },
    })
}

/// OpenAI `/v1/chat/completions`.
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    retry: RetryPolicy,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: http_client(&config),
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        log::debug!("openai: model={}", self.config.model);
        self.retry
            .run(|| chat_completion(&self.client, &self.config, request))
            .await
    }
}
