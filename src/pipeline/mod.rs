//! Recording pipeline for voice memos.
//!
//! This module wires capture → persist → transcribe → format → render →
//! persist and owns the single capture session that presentation layers
//! observe.
//!
//! # Architecture
//!
//! ```text
//! start() / stop() / toggle()          upload_audio(AudioArtifact)
//!        │                                       │
//!        ▼                                       │
//!   AudioSource (trait)                          │
//!        │  AudioArtifact                        │
//!        └────────────────┬──────────────────────┘
//!                         ▼
//!              PipelineOrchestrator            → StageEvent (mpsc)
//!                         │
//!                         ├─ FileStore::write        recording-<stamp>.<ext>
//!                         ├─ Transcriber             → Transcribing
//!                         ├─ DocumentFormatter       → Formatting (auto_format)
//!                         ├─ TemplateEngine::render
//!                         └─ FileStore::write        transcript-<stamp>.md
//!
//! CaptureSession  ←── PipelineOrchestrator::state()
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voice_memo::config::SettingsStore;
//! use voice_memo::llm::FormatterService;
//! use voice_memo::pipeline::{AudioSource, LocalFileStore, PipelineOrchestrator, StageEvent};
//! use voice_memo::transcription::ExternalToolManager;
//!
//! # fn microphone() -> Arc<dyn AudioSource> { unimplemented!() }
//! #[tokio::main]
//! async fn main() {
//!     let settings = Arc::new(SettingsStore::open_default().unwrap());
//!     let store = LocalFileStore::from_config(&settings.snapshot());
//!     let orchestrator = PipelineOrchestrator::new(
//!         settings,
//!         microphone(),
//!         Arc::new(store),
//!         Arc::new(ExternalToolManager::system()),
//!         Arc::new(FormatterService::new()),
//!     );
//!
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             if let StageEvent::Status(status) = event {
//!                 println!("{status}");
//!             }
//!         }
//!     });
//!
//!     orchestrator.start().await.unwrap();
//!     // ...
//!     let outcome = orchestrator.stop().await.unwrap();
//!     println!("saved {}", outcome.transcript_path.display());
//! }
//! ```

pub mod document;
pub mod ports;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use document::{build_variables, extension_for_mime, file_stamp, mime_for_extension};
pub use ports::{
    AudioSource, CaptureError, DocumentFormatter, FileStore, LocalFileStore, Transcriber,
};
pub use runner::{PipelineError, PipelineOrchestrator, RunOutcome};
pub use state::{ArtifactInfo, AudioArtifact, CaptureSession, RecordingStatus, StageEvent};
