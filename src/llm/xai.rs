//! xAI adapter.  Same wire format as OpenAI chat completions.

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::llm::openai::chat_completion;
use crate::llm::provider::{
    http_client, CompletionProvider, CompletionRequest, CompletionResponse, ProviderError,
    ProviderKind,
};
use crate::llm::RetryPolicy;

pub struct XaiProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    retry: RetryPolicy,
}

impl XaiProvider {
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
impl CompletionProvider for XaiProvider {
    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Xai
    }

    fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        log::debug!("xai: model={}", self.config.model);
        self.retry
            .run(|| chat_completion(&self.client, &self.config, request))
            .await
    }
}
