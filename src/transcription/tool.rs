//! The external speech-to-text tool.
//!
//! [`ExternalToolManager`] finds the `voxmlx` executable (configured path or
//! a few well-known install locations), installs it when missing and runs it
//! on an audio file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{AppConfig, TranscriptionConfig};
use crate::transcription::converter::AudioFormatBridge;
use crate::transcription::installer::{
    default_strategies, InstallStrategy, Preconditions, MANUAL_INSTALL_HINT,
};
use crate::transcription::result::{parse_tool_output, TranscriptionMetadata, TranscriptionResult};
use crate::transcription::runner::{CommandRunner, RunError, SystemRunner};

/// Executable name looked up on the extended search path.
pub const TOOL_NAME: &str = "voxmlx";

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_OUTPUT: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// TranscriptionError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranscriptionError {
    /// A host requirement for installing the tool is not met.
    #[error("{0}")]
    PreconditionFailed(String),

    /// Every install strategy failed.
    #[error("Failed to install voxmlx ({}). Please install manually: {hint}", attempts.join("; "))]
    InstallationFailed { attempts: Vec<String>, hint: String },

    #[error("Transcription timed out after {}s. The audio file may be too long.", .0.as_secs())]
    TranscriptionTimeout(Duration),

    #[error("{0}")]
    ConversionFailed(String),

    /// The tool could not be started.
    #[error("failed to launch voxmlx: {0}")]
    Spawn(String),

    /// The tool ran and exited unsuccessfully.
    #[error("Transcription failed: {0}")]
    Failed(String),

    #[error("Transcription output exceeded {0} bytes")]
    OutputTooLarge(usize),
}

impl From<RunError> for TranscriptionError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::TimedOut { timeout, .. } => TranscriptionError::TranscriptionTimeout(timeout),
            RunError::OutputTooLarge { limit, .. } => TranscriptionError::OutputTooLarge(limit),
            other => TranscriptionError::Spawn(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// ExternalToolManager
// ---------------------------------------------------------------------------

pub struct ExternalToolManager {
    runner: Arc<dyn CommandRunner>,
    strategies: Vec<Box<dyn InstallStrategy>>,
    preconditions: Preconditions,
    bridge: AudioFormatBridge,
}

impl ExternalToolManager {
    /// Production manager: real processes, default install strategies.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            bridge: AudioFormatBridge::new(runner.clone()),
            runner,
            strategies: default_strategies(),
            preconditions: Preconditions::default(),
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn InstallStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_preconditions(mut self, preconditions: Preconditions) -> Self {
        self.preconditions = preconditions;
        self
    }

    pub fn bridge(&self) -> &AudioFormatBridge {
        &self.bridge
    }

    /// Executables to probe, most specific first, without duplicates.
    pub fn candidates(config: &TranscriptionConfig) -> Vec<String> {
        let mut list = Vec::new();
        let configured = config.tool_path.trim();
        if !configured.is_empty() {
            list.push(configured.to_string());
        }
        list.push(TOOL_NAME.to_string());
        if let Some(home) = dirs::home_dir() {
            list.push(home.join(".local/bin").join(TOOL_NAME).display().to_string());
        }
        list.push(format!("/opt/homebrew/bin/{TOOL_NAME}"));
        list.push(format!("/usr/local/bin/{TOOL_NAME}"));

        let mut seen = std::collections::HashSet::new();
        list.retain(|c| seen.insert(c.clone()));
        list
    }

    async fn probe(&self, executable: &str) -> Option<String> {
        let out = self
            .runner
            .run(executable, &["--version".to_string()], PROBE_TIMEOUT, PROBE_OUTPUT)
            .await
            .ok()?;
        if !out.success {
            return None;
        }
        let text = if out.stdout.trim().is_empty() {
            out.stderr.trim()
        } else {
            out.stdout.trim()
        };
        Some(text.to_string())
    }

    /// First candidate that answers `--version`, with that output.
    async fn locate(&self, config: &TranscriptionConfig) -> Option<(String, String)> {
        for candidate in Self::candidates(config) {
            if let Some(version) = self.probe(&candidate).await {
                return Some((candidate, version));
            }
        }
        None
    }

    /// Version string of the installed tool, if any.
    pub async fn version(&self, config: &TranscriptionConfig) -> Option<String> {
        self.locate(config).await.map(|(_, version)| version)
    }

    /// Make sure the tool is runnable, installing it if necessary.
    ///
    /// Returns the executable to invoke.
    pub async fn ensure_available(
        &self,
        config: &TranscriptionConfig,
    ) -> Result<String, TranscriptionError> {
        if let Some((exe, version)) = self.locate(config).await {
            log::debug!("tool: using {exe} ({version})");
            return Ok(exe);
        }

        log::info!("tool: {TOOL_NAME} not found, attempting install");
        self.preconditions
            .check(self.runner.as_ref(), config)
            .await?;

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let described = strategy.describe();
            match strategy.install(self.runner.as_ref()).await {
                Ok(()) => {
                    if let Some((exe, version)) = self.locate(config).await {
                        log::info!("tool: installed via `{described}` ({version})");
                        return Ok(exe);
                    }
                    attempts.push(format!("{described}: installed but --version still fails"));
                }
                Err(reason) => attempts.push(format!("{described}: {reason}")),
            }
            if let Some(last) = attempts.last() {
                log::warn!("tool: install attempt failed: {last}");
            }
        }

        Err(TranscriptionError::InstallationFailed {
            attempts,
            hint: MANUAL_INSTALL_HINT.to_string(),
        })
    }

    /// Transcribe `audio_path` (absolute, or relative to the vault root).
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        config: &AppConfig,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let settings = &config.transcription;
        let exe = self.ensure_available(settings).await?;

        let absolute = absolute_path(&config.storage.vault_root, audio_path);
        let scratch = if AudioFormatBridge::needs_conversion(&absolute) {
            Some(self.bridge.convert_to_wav(&absolute).await?)
        } else {
            None
        };
        let input = scratch
            .as_ref()
            .map_or(absolute.as_path(), |s| s.path());

        log::info!("tool: transcribing {}", input.display());
        let started = Instant::now();
        let out = self
            .runner
            .run(
                &exe,
                &["--audio".to_string(), input.display().to_string()],
                settings.timeout(),
                settings.max_output_bytes,
            )
            .await?;
        let processing_time = started.elapsed();

        if !out.success {
            return Err(TranscriptionError::Failed(out.failure_summary()));
        }
        if !out.stderr.trim().is_empty() {
            log::debug!("tool: stderr: {}", out.stderr.trim());
        }

        let parsed = parse_tool_output(&out.stdout);
        log::info!(
            "tool: {} chars, language={}, {} ms",
            parsed.text.len(),
            parsed.language,
            processing_time.as_millis()
        );

        Ok(TranscriptionResult {
            text: parsed.text,
            duration: parsed.duration,
            language: parsed.language,
            speaker_count: parsed.speaker_count,
            segments: parsed.segments,
            metadata: TranscriptionMetadata {
                model: settings.model.clone(),
                processing_time,
                audio_path: audio_path.to_path_buf(),
                timestamp: chrono::Utc::now(),
            },
        })
    }
}

/// `path` joined onto `root` when relative, then made absolute against the
/// working directory (a relative vault root such as `.` stays relative
/// otherwise).
fn absolute_path(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    std::path::absolute(&joined).unwrap_or(joined)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
