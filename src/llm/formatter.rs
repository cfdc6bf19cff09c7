//! Transcript → structured document.
//!
//! [`FormatterService`] picks the active provider from a configuration
//! snapshot, refuses to touch the network when that provider has no
//! credential, sends the template-bound prompt pair and post-processes the
//! markdown it gets back.

use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::config::{AppConfig, ProviderConfig, TemplateConfig};
use crate::llm::anthropic::AnthropicProvider;
use crate::llm::extract::{derive_title, extract_action_items, extract_decisions, extract_summary};
use crate::llm::google::GoogleProvider;
use crate::llm::openai::OpenAiProvider;
use crate::llm::prompt::PromptBuilder;
use crate::llm::provider::{CompletionProvider, CompletionRequest, ProviderError, ProviderKind};
use crate::llm::xai::XaiProvider;
use crate::llm::RetryPolicy;
use crate::templates::resolve_template;

// ---------------------------------------------------------------------------
// FormatError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// The configured provider id names no known vendor.
    #[error("Unknown provider: {0}")]
    ProviderUnavailable(String),

    /// The selected vendor has no credential configured.
    #[error("{} API key not configured. Please add your API key in settings.", .0.display_name())]
    MissingCredential(ProviderKind),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

// ---------------------------------------------------------------------------
// FormattedDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatMetadata {
    pub provider: ProviderKind,
    pub model: String,
    pub template_id: String,
    pub tokens_used: u64,
    pub processing_time: Duration,
}

/// One formatting result.  Produced once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedDocument {
    pub content: String,
    pub title: String,
    pub summary: Option<String>,
    pub action_items: Option<Vec<String>>,
    pub decisions: Option<Vec<String>>,
    pub metadata: FormatMetadata,
}

// ---------------------------------------------------------------------------
// Provider factory
// ---------------------------------------------------------------------------

/// Build the adapter for `kind`.
pub fn provider_for(
    kind: ProviderKind,
    config: ProviderConfig,
    retry: RetryPolicy,
) -> Box<dyn CompletionProvider> {
    match kind {
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(config).with_retry(retry)),
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(config).with_retry(retry)),
        ProviderKind::Google => Box::new(GoogleProvider::new(config).with_retry(retry)),
        ProviderKind::Xai => Box::new(XaiProvider::new(config).with_retry(retry)),
    }
}

// ---------------------------------------------------------------------------
// FormatterService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FormatterService {
    retry: RetryPolicy,
}

impl FormatterService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Format `transcript` with the provider selected in `config`.
    pub async fn format(
        &self,
        transcript: &str,
        template_id: &str,
        config: &AppConfig,
    ) -> Result<FormattedDocument, FormatError> {
        let kind: ProviderKind = config
            .ai
            .provider
            .parse()
            .map_err(|_| FormatError::ProviderUnavailable(config.ai.provider.clone()))?;

        let provider = provider_for(kind, kind.config_from(&config.ai), self.retry);
        format_with(provider.as_ref(), transcript, template_id, &config.templates).await
    }
}

/// Format `transcript` with an already-built provider.
///
/// The credential check runs first; an unconfigured provider is never called.
pub async fn format_with(
    provider: &dyn CompletionProvider,
    transcript: &str,
    template_id: &str,
    templates: &TemplateConfig,
) -> Result<FormattedDocument, FormatError> {
    let kind = provider.provider_kind();
    if !provider.is_configured() {
        log::warn!("formatter: {kind} has no API key configured");
        return Err(FormatError::MissingCredential(kind));
    }

    let template = resolve_template(template_id, templates);
    let (system_prompt, user_prompt) = PromptBuilder::new(&template).build_chat(transcript);
    let request = CompletionRequest {
        system_prompt,
        user_prompt,
        max_tokens: None,
    };

    log::info!(
        "formatter: provider={kind} template={} transcript_len={}",
        template.id,
        transcript.len()
    );

    let started = Instant::now();
    let response = provider.complete(&request).await?;
    let processing_time = started.elapsed();

    log::info!(
        "formatter: {} tokens in {} ms (model={})",
        response.usage.total(),
        processing_time.as_millis(),
        response.model
    );

    let content = response.content;
    Ok(FormattedDocument {
        title: derive_title(&content),
        summary: extract_summary(&content),
        action_items: extract_action_items(&content),
        decisions: extract_decisions(&content),
        metadata: FormatMetadata {
            provider: kind,
            model: response.model,
            template_id: template_id.to_string(),
            tokens_used: response.usage.total(),
            processing_time,
        },
        content,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
