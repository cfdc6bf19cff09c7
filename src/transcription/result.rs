//! Transcription result types and tool-output parsing.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One speaker turn reported by the tool.  Times are seconds from the start
/// of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: String,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionMetadata {
    /// Model id from the transcription settings.
    pub model: String,
    pub processing_time: Duration,
    /// The audio path as handed to `transcribe`, before any conversion.
    pub audio_path: PathBuf,
    pub timestamp: DateTime<Utc>,
}

/// The output of one transcription run.  Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    /// Audio length in seconds as reported by the tool; 0 when unknown.
    pub duration: f64,
    pub language: String,
    pub speaker_count: usize,
    pub segments: Vec<Segment>,
    pub metadata: TranscriptionMetadata,
}

// ---------------------------------------------------------------------------
// Tool output
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ToolSegment {
    #[serde(default)]
    speaker: String,
    #[serde(default)]
    text: String,
    #[serde(default, rename = "startTime")]
    start_time: f64,
    #[serde(default, rename = "endTime")]
    end_time: f64,
}

#[derive(Debug, Deserialize)]
struct ToolOutput {
    text: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    speakers: Vec<String>,
    #[serde(default)]
    segments: Vec<ToolSegment>,
}

/// Everything parsed from the tool's stdout.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedOutput {
    pub text: String,
    pub duration: f64,
    pub language: String,
    pub speaker_count: usize,
    pub segments: Vec<Segment>,
}

const UNKNOWN_LANGUAGE: &str = "unknown";

/// Parse structured JSON output, falling back to the trimmed raw text.
pub(crate) fn parse_tool_output(stdout: &str) -> ParsedOutput {
    match serde_json::from_str::<ToolOutput>(stdout.trim()) {
        Ok(out) => ParsedOutput {
            text: out.text,
            duration: out.duration.unwrap_or(0.0),
            language: out
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
            speaker_count: out.speakers.len().max(1),
            segments: out
                .segments
                .into_iter()
                .map(|s| Segment {
                    speaker: s.speaker,
                    text: s.text,
                    start: s.start_time,
                    end: s.end_time,
                })
                .collect(),
        },
        Err(e) => {
            log::debug!("tool: output is not structured ({e}); using raw text");
            ParsedOutput {
                text: stdout.trim().to_string(),
                duration: 0.0,
                language: UNKNOWN_LANGUAGE.to_string(),
                speaker_count: 1,
                segments: Vec::new(),
            }
        }
    }
}
