//! Anthropic Messages API adapter.
//!
//! Auth goes in the `x-api-key` header; the system prompt is a top-level
//! field and the transcript is the single user message.

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::llm::provider::{
    http_client, send_json, CompletionProvider, CompletionRequest, CompletionResponse,
    ProviderError, ProviderKind, Usage,
};
use crate::llm::RetryPolicy;

const API_VERSION: &str = "2023-06-01";

/// Calls `POST {endpoint}` with the Messages request shape.
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    retry: RetryPolicy,
}

impl AnthropicProvider {
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

    async fn send_once(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "system": request.system_prompt,
            "messages": [
                { "role": "user", "content": request.user_prompt }
            ]
        });

        let req = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let json = send_json(req).await?;

        let content = json["content"][0]["text"]
            .as_str()
            .ok_or_else(|| ProviderError::Parse("missing content[0].text".into()))?
            .to_string();

        Ok(CompletionResponse {
            content,
            model: json["model"]
                .as_str()
                .unwrap_or(&self.config.model)
                .to_string(),
            usage: Usage {
                input_tokens: json["usage"]["input_tokens"].as_u64().unwrap_or(0),
                output_tokens: json["usage"]["output_tokens"].as_u64().unwrap_or(0),
            },
        })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        log::debug!(
            "anthropic: model={} system={}B user={}B",
            self.config.model,
            request.system_prompt.len(),
            request.user_prompt.len()
        );
        self.retry.run(|| self.send_once(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_only_with_key() {
        let mut cfg = ProviderConfig::default();
        assert!(!AnthropicProvider::new(cfg.clone()).is_configured());
        cfg.api_key = "sk-ant".into();
        assert!(AnthropicProvider::new(cfg).is_configured());
    }

    #[test]
    fn provider_is_object_safe() {
        let provider: Box<dyn CompletionProvider> =
            Box::new(AnthropicProvider::new(ProviderConfig::default()));
        assert_eq!(provider.provider_kind(), ProviderKind::Anthropic);
    }
}
