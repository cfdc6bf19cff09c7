//! Audio container conversion ahead of transcription.
//!
//! The tool reads a small set of formats directly.  Anything else is
//! resampled to 16 kHz mono 16-bit PCM WAV with `ffmpeg`; the intermediate is
//! held by a [`ScratchFile`] and deleted when the guard drops, whether the run
//! succeeded or not.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::transcription::runner::{CommandRunner, RunError};
use crate::transcription::tool::TranscriptionError;

/// Extensions the tool accepts without conversion.
pub const SUPPORTED_FORMATS: &[&str] = &["wav", "flac", "mp3", "ogg"];

pub const SAMPLE_RATE: u32 = 16_000;
pub const CHANNELS: u32 = 1;

const CONVERT_TIMEOUT: Duration = Duration::from_secs(120);
const CONVERT_OUTPUT: usize = 1024 * 1024;
const FFMPEG_HINT: &str = "brew install ffmpeg";

// ---------------------------------------------------------------------------
// ScratchFile
// ---------------------------------------------------------------------------

/// A temporary file removed on drop.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("converter: removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "converter: failed to delete {}: {e}",
                self.path.display()
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioFormatBridge
// ---------------------------------------------------------------------------

pub struct AudioFormatBridge {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: String,
}

impl AudioFormatBridge {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            ffmpeg: "ffmpeg".to_string(),
        }
    }

    /// `true` when the extension is outside [`SUPPORTED_FORMATS`].
    pub fn needs_conversion(path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        !SUPPORTED_FORMATS.contains(&ext.as_str())
    }

    /// Where the converted copy of `input` is written.
    pub fn output_path(input: &Path) -> PathBuf {
        input.with_extension("16k.wav")
    }

    /// Convert `input` to WAV next to it.
    pub async fn convert_to_wav(&self, input: &Path) -> Result<ScratchFile, TranscriptionError> {
        // Guard first so a partial output is removed on failure too.
        let scratch = ScratchFile::new(Self::output_path(input));

        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-ar".to_string(),
            SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            CHANNELS.to_string(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            scratch.path().display().to_string(),
        ];

        log::info!("converter: {} -> {}", input.display(), scratch.path().display());

        let out = self
            .runner
            .run(&self.ffmpeg, &args, CONVERT_TIMEOUT, CONVERT_OUTPUT)
            .await
            .map_err(|e| match e {
                RunError::NotFound { .. } => TranscriptionError::ConversionFailed(format!(
                    "ffmpeg not found. Please install: {FFMPEG_HINT}"
                )),
                other => TranscriptionError::ConversionFailed(format!(
                    "Audio conversion failed: {other}"
                )),
            })?;

        if !out.success {
            return Err(TranscriptionError::ConversionFailed(format!(
                "Audio conversion failed: {}",
                out.failure_summary()
            )));
        }
        Ok(scratch)
    }

    /// `true` when `ffmpeg -version` runs.
    pub async fn converter_available(&self) -> bool {
        matches!(
            self.runner
                .run(&self.ffmpeg, &["-version".to_string()], CONVERT_TIMEOUT, CONVERT_OUTPUT)
                .await,
            Ok(out) if out.success
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::runner::{CommandOutput, ScriptedRunner};

    #[test]
    fn allowlist_is_case_insensitive() {
        assert!(!AudioFormatBridge::needs_conversion(Path::new("a/b.wav")));
        assert!(!AudioFormatBridge::needs_conversion(Path::new("b.FLAC")));
        assert!(!AudioFormatBridge::needs_conversion(Path::new("b.mp3")));
        assert!(!AudioFormatBridge::needs_conversion(Path::new("b.ogg")));
        assert!(AudioFormatBridge::needs_conversion(Path::new("b.webm")));
        assert!(AudioFormatBridge::needs_conversion(Path::new("b.m4a")));
        assert!(AudioFormatBridge::needs_conversion(Path::new("no_extension")));
    }

    #[test]
    fn output_sits_next_to_input() {
        assert_eq!(
            AudioFormatBridge::output_path(Path::new("/v/rec/recording-1.webm")),
            PathBuf::from("/v/rec/recording-1.16k.wav")
        );
    }

    #[test]
    fn scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmp.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        drop(ScratchFile::new(path.clone()));
        assert!(!path.exists());

        // Already gone: dropping again is silent.
        drop(ScratchFile::new(path));
    }

    #[tokio::test]
    async fn converts_with_fixed_resample_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.webm");
        let runner = Arc::new(ScriptedRunner::new(|_, args| {
            std::fs::write(args.last().unwrap(), b"RIFF").unwrap();
            Ok(CommandOutput::ok(""))
        }));
        let bridge = AudioFormatBridge::new(runner.clone());

        let scratch = bridge.convert_to_wav(&input).await.unwrap();
        let out_path = scratch.path().to_path_buf();
        assert!(out_path.exists());

        let call = &runner.calls()[0];
        assert!(call.starts_with("ffmpeg -y -i "));
        assert!(call.contains("-ar 16000 -ac 1 -c:a pcm_s16le"));

        drop(scratch);
        assert!(!out_path.exists());
    }

    #[tokio::test]
    async fn missing_ffmpeg_carries_install_hint() {
        let runner = Arc::new(ScriptedRunner::new(|p, _| Err(ScriptedRunner::not_found(p))));
        let bridge = AudioFormatBridge::new(runner);

        let err = bridge
            .convert_to_wav(Path::new("/tmp/x.webm"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TranscriptionError::ConversionFailed(
                "ffmpeg not found. Please install: brew install ffmpeg".into()
            )
        );
        assert!(!bridge.converter_available().await);
    }

    #[tokio::test]
    async fn failed_conversion_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.m4a");
        let partial = AudioFormatBridge::output_path(&input);
        let runner = Arc::new(ScriptedRunner::new(|_, args| {
            std::fs::write(args.last().unwrap(), b"half").unwrap();
            Ok(CommandOutput::failed(1, "Invalid data found when processing input"))
        }));

        let err = AudioFormatBridge::new(runner)
            .convert_to_wav(&input)
            .await
            .unwrap_err();

        assert!(matches!(err, TranscriptionError::ConversionFailed(ref m) if m.contains("Invalid data")));
        assert!(!partial.exists());
    }
}
