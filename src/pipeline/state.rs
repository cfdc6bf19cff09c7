//! Pipeline state machine and the capture session record.
//!
//! [`RecordingStatus`] drives the orchestrator's state machine.
//! [`CaptureSession`] is the single record the orchestrator mutates at every
//! transition; presentation layers receive copies of it or [`StageEvent`]s.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// RecordingStatus
// ---------------------------------------------------------------------------

/// States of one capture run.
///
/// ```text
/// Idle ──start──▶ Recording ──stop──▶ Processing
/// Idle ──upload────────────────────▶ Processing
///      Processing ──▶ Transcribing ──▶ Formatting ──▶ Complete ──▶ Idle
///                     Transcribing ─────────────────▶ Complete   (auto-format off)
/// any state ──failure──▶ Error ──start / upload──▶ …
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    #[default]
    Idle,
    Recording,
    Processing,
    Transcribing,
    Formatting,
    Complete,
    Error,
}

impl RecordingStatus {
    /// `true` when a fresh `start()` / `upload_audio()` may begin.
    ///
    /// ```
    /// use voice_memo::pipeline::RecordingStatus;
    ///
    /// assert!(RecordingStatus::Idle.accepts_new_run());
    /// assert!(!RecordingStatus::Formatting.accepts_new_run());
    /// assert!(RecordingStatus::Error.accepts_new_run());
    /// ```
    pub fn accepts_new_run(&self) -> bool {
        matches!(
            self,
            RecordingStatus::Idle | RecordingStatus::Complete | RecordingStatus::Error
        )
    }

    /// Short label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            RecordingStatus::Idle => "Idle",
            RecordingStatus::Recording => "Recording",
            RecordingStatus::Processing => "Saving audio",
            RecordingStatus::Transcribing => "Transcribing",
            RecordingStatus::Formatting => "Formatting",
            RecordingStatus::Complete => "Done",
            RecordingStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// AudioArtifact
// ---------------------------------------------------------------------------

/// Opaque audio buffer handed over by a capture device or an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub bytes: Vec<u8>,
    /// E.g. `audio/webm;codecs=opus`.
    pub mime_type: String,
}

impl AudioArtifact {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// What the session remembers about its artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub mime_type: String,
    pub size_bytes: usize,
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// The one active run.  Reset to a fresh baseline after completion or
/// failure; a failed baseline keeps `status == Error` and the message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureSession {
    pub status: RecordingStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed: Duration,
    pub artifact: Option<ArtifactInfo>,
    /// Persisted audio path, relative to the vault root.
    pub audio_path: Option<PathBuf>,
    pub last_error: Option<String>,
}

impl CaptureSession {
    pub(crate) fn with_status(status: RecordingStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub(crate) fn failed(message: String) -> Self {
        Self {
            status: RecordingStatus::Error,
            last_error: Some(message),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// StageEvent
// ---------------------------------------------------------------------------

/// Notifications sent to presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// The session moved to a new status.
    Status(RecordingStatus),
    /// Periodic recording-duration update.
    Tick(Duration),
    /// The run finished; the document is at this path.
    Saved(PathBuf),
    /// The run failed with this message.
    Failed(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
