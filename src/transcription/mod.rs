//! Speech-to-text via an external command-line tool.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  ExternalToolManager                      │
//! │                                                          │
//! │  ensure_available()                                      │
//! │    probe candidates ──▶ Preconditions ──▶ InstallStrategy │
//! │                                           (ordered)      │
//! │  transcribe(path)                                        │
//! │    AudioFormatBridge ──▶ voxmlx --audio ──▶ parse output  │
//! │    (ScratchFile)                                         │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │
//!                     CommandRunner (trait)
//!                     SystemRunner: tokio::process
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use voice_memo::config::AppConfig;
//! use voice_memo::transcription::ExternalToolManager;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let tool = ExternalToolManager::system();
//!     let result = tool
//!         .transcribe(Path::new("vmemo-recordings/recording.webm"), &config)
//!         .await
//!         .unwrap();
//!     println!("{} ({})", result.text, result.language);
//! }
//! ```

pub mod converter;
pub mod installer;
pub mod result;
pub mod runner;
pub mod tool;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use converter::{AudioFormatBridge, ScratchFile, SUPPORTED_FORMATS};
pub use installer::{default_strategies, CommandStrategy, InstallStrategy, Preconditions};
pub use result::{Segment, TranscriptionMetadata, TranscriptionResult};
pub use runner::{CommandOutput, CommandRunner, RunError, SystemRunner};
pub use tool::{ExternalToolManager, TranscriptionError};
