//! Seams between the orchestrator and its collaborators.
//!
//! The capture device, the file store, the transcriber and the formatter are
//! all reached through object-safe `Send + Sync` traits so the orchestrator
//! can hold them as `Arc<dyn …>` and tests can swap them out.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AppConfig;
use crate::llm::{FormatError, FormattedDocument, FormatterService};
use crate::transcription::{ExternalToolManager, TranscriptionError, TranscriptionResult};

use super::state::AudioArtifact;

// ---------------------------------------------------------------------------
// AudioSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("No microphone found. Please connect an audio input device.")]
    NoDevice,

    #[error("Microphone access denied.")]
    PermissionDenied,

    #[error("Recording failed: {0}")]
    Device(String),
}

/// An external capture device producing one opaque artifact per session.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn start(&self) -> Result<(), CaptureError>;

    /// Finish capturing and hand over the audio.
    async fn stop(&self) -> Result<AudioArtifact, CaptureError>;
}

// Compile-time assertion: Box<dyn AudioSource> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AudioSource>) {}
};

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Key/path store for persisted artifacts.  Paths are relative to the store.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;

    async fn exists(&self, path: &Path) -> bool;

    async fn create_dir(&self, path: &Path) -> std::io::Result<()>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn FileStore>) {}
};

/// A [`FileStore`] rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the configured vault root.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.storage.vault_root.clone())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(self.resolve(path), bytes).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(self.resolve(path))
            .await
            .unwrap_or(false)
    }

    async fn create_dir(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.resolve(path)).await
    }
}

// ---------------------------------------------------------------------------
// Transcriber / DocumentFormatter
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// `audio_path` is relative to the vault root.
    async fn transcribe(
        &self,
        audio_path: &Path,
        config: &AppConfig,
    ) -> Result<TranscriptionResult, TranscriptionError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Transcriber>) {}
};

#[async_trait]
impl Transcriber for ExternalToolManager {
    async fn transcribe(
        &self,
        audio_path: &Path,
        config: &AppConfig,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        ExternalToolManager::transcribe(self, audio_path, config).await
    }
}

#[async_trait]
pub trait DocumentFormatter: Send + Sync {
    async fn format(
        &self,
        transcript: &str,
        template_id: &str,
        config: &AppConfig,
    ) -> Result<FormattedDocument, FormatError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn DocumentFormatter>) {}
};

#[async_trait]
impl DocumentFormatter for FormatterService {
    async fn format(
        &self,
        transcript: &str,
        template_id: &str,
        config: &AppConfig,
    ) -> Result<FormattedDocument, FormatError> {
        FormatterService::format(self, transcript, template_id, config).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
