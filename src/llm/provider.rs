//! Uniform completion contract over the LLM vendors.
//!
//! [`CompletionProvider`] is the one interface the formatter talks to.  The
//! vendor adapters differ only in request shape, where the key goes, and how
//! the response is parsed; they all normalise HTTP failures through
//! [`error_for_status`] and wrap the request in a [`RetryPolicy`].
//!
//! [`RetryPolicy`]: crate::llm::RetryPolicy

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AiConfig, ProviderConfig};

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// Tag identifying a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Google,
    Xai,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Anthropic,
        ProviderKind::OpenAi,
        ProviderKind::Google,
        ProviderKind::Xai,
    ];

    /// Settings id used in `settings.toml`.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Google => "google",
            ProviderKind::Xai => "xai",
        }
    }

    /// Human-readable vendor name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Google => "Google",
            ProviderKind::Xai => "xAI",
        }
    }

    /// This vendor's settings with empty fields filled from the defaults.
    pub fn config_from(&self, ai: &AiConfig) -> ProviderConfig {
        let defaults = AiConfig::default();
        let (own, fallback) = match self {
            ProviderKind::Anthropic => (&ai.anthropic, &defaults.anthropic),
            ProviderKind::OpenAi => (&ai.openai, &defaults.openai),
            ProviderKind::Google => (&ai.google, &defaults.google),
            ProviderKind::Xai => (&ai.xai, &defaults.xai),
        };
        own.merged_with(fallback)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "google" => Ok(ProviderKind::Google),
            "xai" => Ok(ProviderKind::Xai),
            other => Err(format!(
                "Unknown provider: {other}. Use 'anthropic', 'openai', 'google', or 'xai'"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Overrides the provider's configured token ceiling.
    pub max_tokens: Option<u32>,
}

/// Token accounting reported by the vendor.  Missing fields count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Normalised completion result.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

// ---------------------------------------------------------------------------
// ProviderError
// ---------------------------------------------------------------------------

/// Transport outcomes, identical across vendors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP 401.
    #[error("Invalid API key")]
    InvalidCredential,

    /// HTTP 429.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// HTTP 5xx.
    #[error("Provider server error. Please try again.")]
    ProviderUnavailable,

    /// Any other non-success status, with the upstream message.
    #[error("API Error: {0}")]
    Api(String),

    /// Connection, TLS or timeout failure before a status was received.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// A success status whose body did not have the expected shape.
    #[error("failed to parse provider response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Request(e.to_string())
    }
}

/// Map a non-success status and its body to a [`ProviderError`].
///
/// The upstream message is read from `error.message` or a top-level
/// `message`, whichever is present.
pub fn error_for_status(status: u16, body: &serde_json::Value) -> ProviderError {
    match status {
        401 => ProviderError::InvalidCredential,
        429 => ProviderError::RateLimited,
        s if s >= 500 => ProviderError::ProviderUnavailable,
        _ => {
            let message = body["error"]["message"]
                .as_str()
                .or_else(|| body["message"].as_str())
                .unwrap_or("Unknown API error");
            ProviderError::Api(message.to_string())
        }
    }
}

/// Send a prepared request and return the JSON body of a success response.
///
/// Non-success statuses are normalised with [`error_for_status`]; a body that
/// is not JSON is treated as an empty object for that purpose.
pub(crate) async fn send_json(
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let body: serde_json::Value = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);

    if !status.is_success() {
        return Err(error_for_status(status.as_u16(), &body));
    }
    if body.is_null() {
        return Err(ProviderError::Parse(format!(
            "response body is not JSON ({} bytes)",
            text.len()
        )));
    }
    Ok(body)
}

/// Build the shared HTTP client for one provider.
pub(crate) fn http_client(config: &ProviderConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs.max(1)))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

// ---------------------------------------------------------------------------
// CompletionProvider trait
// ---------------------------------------------------------------------------

/// Async trait implemented by every vendor adapter.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn CompletionProvider>`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn provider_kind(&self) -> ProviderKind;

    /// `true` iff a non-empty credential is configured.
    fn is_configured(&self) -> bool;

    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, ProviderError>;
}

// Compile-time assertion: Box<dyn CompletionProvider> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn CompletionProvider>) {}
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
