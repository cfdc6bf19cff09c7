//! Google Generative Language (`generateContent`) adapter.
//!
//! The key travels in the query string, the system prompt in
//! `system_instruction`, and the token ceiling in
//! `generationConfig.maxOutputTokens`.

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::llm::provider::{
    http_client, send_json, CompletionProvider, CompletionRequest, CompletionResponse,
    ProviderError, ProviderKind, Usage,
};
use crate::llm::RetryPolicy;

pub struct GoogleProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    retry: RetryPolicy,
}

impl GoogleProvider {
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

    /// `{endpoint}/{model}:generateContent`; the key is added as a query
    /// parameter by the request builder.
    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn send_once(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let body = serde_json::json!({
            "system_instruction": {
                "parts": [ { "text": request.system_prompt } ]
            },
            "contents": [
                { "parts": [ { "text": request.user_prompt } ] }
            ],
            "generationConfig": {
                "maxOutputTokens": request.max_tokens.unwrap_or(self.config.max_tokens)
            }
        });

        let req = self
            .client
            .post(self.url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body);

        let json = send_json(req).await?;

        let content = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::Parse("missing candidates[0].content.parts[0].text".into())
            })?
            .to_string();

        Ok(CompletionResponse {
            content,
            model: self.config.model.clone(),
            usage: Usage {
                input_tokens: json["usageMetadata"]["promptTokenCount"]
                    .as_u64()
                    .unwrap_or(0),
                output_tokens: json["usageMetadata"]["candidatesTokenCount"]
                    .as_u64()
                    .unwrap_or(0),
            },
        })
    }
}

#[async_trait]
impl CompletionProvider for GoogleProvider {
    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        log::debug!("google: model={}", self.config.model);
        self.retry.run(|| self.send_once(request)).await
    }
}
