//! LLM formatting module.
//!
//! This module provides:
//! * [`CompletionProvider`]: async trait implemented by every vendor adapter.
//! * [`AnthropicProvider`], [`OpenAiProvider`], [`GoogleProvider`],
//!   [`XaiProvider`]: REST adapters.
//! * [`RetryPolicy`]: bounded exponential backoff shared by all adapters.
//! * [`PromptBuilder`]: template-bound system prompt plus transcript frame.
//! * [`FormatterService`]: provider selection, completion and section
//!   extraction.
//! * [`ProviderError`] / [`FormatError`]: error variants.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_memo::config::SettingsStore;
//! use voice_memo::llm::FormatterService;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SettingsStore::open_default().unwrap();
//!     let config = store.snapshot();
//!
//!     let doc = FormatterService::new()
//!         .format("um so we agreed to ship on friday", "meeting-notes", &config)
//!         .await
//!         .unwrap();
//!
//!     println!("{}\n\n{}", doc.title, doc.content);
//! }
//! ```

pub mod anthropic;
pub mod extract;
pub mod formatter;
pub mod google;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod xai;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use anthropic::AnthropicProvider;
pub use formatter::{
    format_with, provider_for, FormatError, FormatMetadata, FormattedDocument, FormatterService,
};
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;
pub use prompt::PromptBuilder;
pub use provider::{
    error_for_status, CompletionProvider, CompletionRequest, CompletionResponse, ProviderError,
    ProviderKind, Usage,
};
pub use retry::RetryPolicy;
pub use xai::XaiProvider;
