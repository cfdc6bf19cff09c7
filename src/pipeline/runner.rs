//! Pipeline orchestrator: capture → persist → transcribe → format → render →
//! persist.
//!
//! [`PipelineOrchestrator`] owns the single [`CaptureSession`] and is the only
//! place a run's failure is rendered: every error from a collaborator moves
//! the session to `Error`, emits [`StageEvent::Failed`] and is returned to the
//! caller unchanged.
//!
//! # Run flow
//!
//! ```text
//! start()          claim session (Recording) → AudioSource::start → tick task
//! stop()           abort tick → Processing → AudioSource::stop ─┐
//! upload_audio()   claim session (Processing) ──────────────────┤
//!                                                               ▼
//!   persist recording-<stamp>.<ext>                              [Processing]
//!   Transcriber::transcribe                                      [Transcribing]
//!   DocumentFormatter::format   (only when auto_format is on)    [Formatting]
//!   TemplateEngine::render → persist transcript-<stamp>.md       [Complete]
//!   reset session                                                [Idle]
//! ```
//!
//! Each run reads one settings snapshot, taken when the run is claimed.
//! There is no retry here; transport retries live in the providers.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::{AppConfig, SettingsStore};
use crate::llm::{FormatError, FormattedDocument};
use crate::templates::TemplateEngine;
use crate::transcription::{TranscriptionError, TranscriptionResult};

use super::document::{build_variables, extension_for_mime, file_stamp};
use super::ports::{AudioSource, CaptureError, DocumentFormatter, FileStore, Transcriber};
use super::state::{ArtifactInfo, AudioArtifact, CaptureSession, RecordingStatus, StageEvent};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A run is already in progress (or being set up).
    #[error("A recording is already in progress ({0})")]
    Conflict(RecordingStatus),

    /// `stop()` without an active recording.
    #[error("No recording in progress")]
    NotActive,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Writing an artifact failed.  Not retried.
    #[error("Failed to save {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Formatting(#[from] FormatError),
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub audio_path: PathBuf,
    pub transcript_path: PathBuf,
    pub transcription: TranscriptionResult,
    /// `None` when auto-format is off.
    pub document: Option<FormattedDocument>,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Active {
    session: CaptureSession,
    config: Option<Arc<AppConfig>>,
    started: Option<Instant>,
    tick: Option<JoinHandle<()>>,
    /// The capture device is being acquired.
    acquiring: bool,
}

impl Active {
    fn stop_tick(&mut self) {
        if let Some(tick) = self.tick.take() {
            tick.abort();
        }
    }
}

struct Inner {
    settings: Arc<SettingsStore>,
    source: Arc<dyn AudioSource>,
    store: Arc<dyn FileStore>,
    transcriber: Arc<dyn Transcriber>,
    formatter: Arc<dyn DocumentFormatter>,
    active: Mutex<Active>,
    events: Mutex<Option<mpsc::UnboundedSender<StageEvent>>>,
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Drives capture runs.  Cheap to clone; clones share one session.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_memo::config::SettingsStore;
/// use voice_memo::llm::FormatterService;
/// use voice_memo::pipeline::{AudioArtifact, LocalFileStore, PipelineOrchestrator};
/// use voice_memo::transcription::ExternalToolManager;
///
/// # async fn example(source: Arc<dyn voice_memo::pipeline::AudioSource>) {
/// let settings = Arc::new(SettingsStore::open_default().unwrap());
/// let store = LocalFileStore::from_config(&settings.snapshot());
///
/// let orchestrator = PipelineOrchestrator::new(
///     settings,
///     source,
///     Arc::new(store),
///     Arc::new(ExternalToolManager::system()),
///     Arc::new(FormatterService::new()),
/// );
/// let mut events = orchestrator.subscribe();
///
/// let bytes = std::fs::read("memo.m4a").unwrap();
/// let outcome = orchestrator
///     .upload_audio(AudioArtifact::new(bytes, "audio/mp4"))
///     .await
///     .unwrap();
/// println!("saved {}", outcome.transcript_path.display());
/// # let _ = events.try_recv();
/// # }
/// ```
#[derive(Clone)]
pub struct PipelineOrchestrator {
    inner: Arc<Inner>,
}

impl PipelineOrchestrator {
    pub fn new(
        settings: Arc<SettingsStore>,
        source: Arc<dyn AudioSource>,
        store: Arc<dyn FileStore>,
        transcriber: Arc<dyn Transcriber>,
        formatter: Arc<dyn DocumentFormatter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                source,
                store,
                transcriber,
                formatter,
                active: Mutex::new(Active::default()),
                events: Mutex::new(None),
            }),
        }
    }

    /// Receive stage notifications.  Replaces any earlier subscriber.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StageEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    /// Copy of the current session.
    pub fn state(&self) -> CaptureSession {
        self.lock().session.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.lock().session.status == RecordingStatus::Recording
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Begin capturing.  Rejected with `Conflict` while another run is active.
    pub async fn start(&self) -> Result<(), PipelineError> {
        let config = self.inner.settings.snapshot();
        self.claim(RecordingStatus::Recording, &config)?;

        log::info!("pipeline: acquiring capture device");
        if let Err(e) = self.inner.source.start().await {
            return Err(self.fail(e.into()));
        }

        {
            let mut active = self.lock();
            active.acquiring = false;
            active.session.started_at = Some(Utc::now());
            active.started = Some(Instant::now());
            active.tick = Some(self.spawn_tick(
                config.recording.tick_interval(),
                config.recording.max_duration(),
            ));
        }
        self.emit(StageEvent::Status(RecordingStatus::Recording));
        Ok(())
    }

    /// End capturing and run the rest of the pipeline on the captured audio.
    pub async fn stop(&self) -> Result<RunOutcome, PipelineError> {
        let config = {
            let mut active = self.lock();
            if active.session.status != RecordingStatus::Recording {
                return Err(PipelineError::NotActive);
            }
            if active.acquiring {
                return Err(PipelineError::Conflict(RecordingStatus::Recording));
            }
            active.stop_tick();
            if let Some(started) = active.started {
                active.session.elapsed = started.elapsed();
            }
            active.session.status = RecordingStatus::Processing;
            active
                .config
                .clone()
                .unwrap_or_else(|| self.inner.settings.snapshot())
        };
        self.emit(StageEvent::Status(RecordingStatus::Processing));
        log::info!("pipeline: capture stopped, processing");

        let artifact = match self.inner.source.stop().await {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.process(artifact, config).await
    }

    /// Run the pipeline on existing audio, skipping capture.
    pub async fn upload_audio(&self, artifact: AudioArtifact) -> Result<RunOutcome, PipelineError> {
        let config = self.inner.settings.snapshot();
        self.claim(RecordingStatus::Processing, &config)?;
        self.emit(StageEvent::Status(RecordingStatus::Processing));
        log::info!(
            "pipeline: processing upload ({} bytes, {})",
            artifact.bytes.len(),
            artifact.mime_type
        );
        self.process(artifact, config).await
    }

    /// `stop()` while recording, otherwise `start()`.
    pub async fn toggle(&self) -> Result<Option<RunOutcome>, PipelineError> {
        if self.is_recording() {
            self.stop().await.map(Some)
        } else {
            self.start().await.map(|()| None)
        }
    }

    // -----------------------------------------------------------------------
    // Downstream stages
    // -----------------------------------------------------------------------

    async fn process(
        &self,
        artifact: AudioArtifact,
        config: Arc<AppConfig>,
    ) -> Result<RunOutcome, PipelineError> {
        match self.run_stages(artifact, &config).await {
            Ok(outcome) => {
                log::info!(
                    "pipeline: saved {}",
                    outcome.transcript_path.display()
                );
                self.emit(StageEvent::Saved(outcome.transcript_path.clone()));
                {
                    let mut active = self.lock();
                    *active = Active::default();
                }
                self.emit(StageEvent::Status(RecordingStatus::Idle));
                Ok(outcome)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run_stages(
        &self,
        artifact: AudioArtifact,
        config: &AppConfig,
    ) -> Result<RunOutcome, PipelineError> {
        let now = Utc::now();
        let stamp = file_stamp(now);
        let folder = PathBuf::from(&config.storage.recording_folder);

        // ── 1. Persist audio ─────────────────────────────────────────────
        let audio_path = folder.join(format!(
            "recording-{stamp}.{}",
            extension_for_mime(&artifact.mime_type)
        ));
        self.ensure_folder(&folder).await?;
        self.persist(&audio_path, &artifact.bytes).await?;
        {
            let mut active = self.lock();
            active.session.artifact = Some(ArtifactInfo {
                mime_type: artifact.mime_type.clone(),
                size_bytes: artifact.bytes.len(),
            });
            active.session.audio_path = Some(audio_path.clone());
        }
        drop(artifact);

        // ── 2. Transcribe ────────────────────────────────────────────────
        self.transition(RecordingStatus::Transcribing);
        let transcription = self.inner.transcriber.transcribe(&audio_path, config).await?;
        log::debug!(
            "pipeline: transcript {} chars, {} speaker(s)",
            transcription.text.len(),
            transcription.speaker_count
        );

        // ── 3. Format ────────────────────────────────────────────────────
        let document = if config.ai.auto_format {
            self.transition(RecordingStatus::Formatting);
            let doc = self
                .inner
                .formatter
                .format(&transcription.text, &config.templates.default_template, config)
                .await?;
            Some(doc)
        } else {
            log::debug!("pipeline: auto-format off, skipping formatting");
            None
        };

        // ── 4. Render and persist ────────────────────────────────────────
        let transcript_path = folder.join(format!("transcript-{stamp}.md"));
        let vars = build_variables(
            now,
            &transcription,
            document.as_ref(),
            &audio_path,
            &transcript_path,
        );
        let rendered = TemplateEngine::new(config.templates.clone()).render(&vars);
        self.ensure_folder(&folder).await?;
        self.persist(&transcript_path, rendered.as_bytes()).await?;

        self.transition(RecordingStatus::Complete);
        Ok(RunOutcome {
            audio_path,
            transcript_path,
            transcription,
            document,
        })
    }

    async fn ensure_folder(&self, folder: &Path) -> Result<(), PipelineError> {
        if self.inner.store.exists(folder).await {
            return Ok(());
        }
        log::debug!("pipeline: creating {}", folder.display());
        self.inner
            .store
            .create_dir(folder)
            .await
            .map_err(|e| PipelineError::Persistence {
                path: folder.to_path_buf(),
                message: e.to_string(),
            })
    }

    async fn persist(&self, path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
        self.inner
            .store
            .write(path, bytes)
            .await
            .map_err(|e| PipelineError::Persistence {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Duration tick
    // -----------------------------------------------------------------------

    fn spawn_tick(&self, every: Duration, max: Duration) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let orchestrator = PipelineOrchestrator { inner };
                let Some(elapsed) = orchestrator.record_tick() else { break };

                if elapsed >= max {
                    log::info!("pipeline: maximum recording duration reached");
                    // stop() aborts this task, so it runs on its own.
                    tokio::spawn(async move {
                        if let Err(e) = orchestrator.stop().await {
                            log::warn!("pipeline: auto-stop failed: {e}");
                        }
                    });
                    break;
                }
            }
        })
    }

    fn record_tick(&self) -> Option<Duration> {
        let elapsed = {
            let mut active = self.lock();
            if active.session.status != RecordingStatus::Recording {
                return None;
            }
            let elapsed = active.started.map(|s| s.elapsed()).unwrap_or_default();
            active.session.elapsed = elapsed;
            elapsed
        };
        self.emit(StageEvent::Tick(elapsed));
        Some(elapsed)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Active> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically open a fresh session in `status`, or reject.  A session
    /// claimed as `Recording` stays `acquiring` until the device is open.
    fn claim(&self, status: RecordingStatus, config: &Arc<AppConfig>) -> Result<(), PipelineError> {
        let mut active = self.lock();
        let current = active.session.status;
        if !current.accepts_new_run() || active.acquiring {
            log::warn!("pipeline: rejected new run while {current}");
            return Err(PipelineError::Conflict(current));
        }
        *active = Active {
            session: CaptureSession::with_status(status),
            config: Some(Arc::clone(config)),
            acquiring: status == RecordingStatus::Recording,
            ..Active::default()
        };
        Ok(())
    }

    fn transition(&self, status: RecordingStatus) {
        self.lock().session.status = status;
        log::debug!("pipeline: → {status}");
        self.emit(StageEvent::Status(status));
    }

    fn fail(&self, err: PipelineError) -> PipelineError {
        let message = err.to_string();
        log::error!("pipeline error: {message}");
        {
            let mut active = self.lock();
            active.stop_tick();
            *active = Active {
                session: CaptureSession::failed(message.clone()),
                ..Active::default()
            };
        }
        self.emit(StageEvent::Status(RecordingStatus::Error));
        self.emit(StageEvent::Failed(message));
        err
    }

    fn emit(&self, event: StageEvent) {
        let events = self
            .inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = events.as_ref() {
            let _ = tx.send(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
