//! Naming and variable assembly for one run's artifacts.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};

use crate::llm::FormattedDocument;
use crate::templates::TemplateVariables;
use crate::transcription::TranscriptionResult;

const UNTITLED: &str = "Untitled Recording";
const TITLE_WORDS: usize = 5;
const TITLE_MAX_CHARS: usize = 50;
const TITLE_CUT_CHARS: usize = 47;

/// File-name stamp: ISO-8601 UTC with `:` and `.` replaced by `-`, cut to 19
/// characters (`2026-03-03T09-15-00`).
pub fn file_stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(|c: char| c == ':' || c == '.', "-")
        .chars()
        .take(19)
        .collect()
}

/// Extension for an artifact's mime type.  Unknown types are stored as webm.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    const MAP: &[(&str, &str)] = &[
        ("webm", "webm"),
        ("ogg", "ogg"),
        ("mp4", "m4a"),
        ("mpeg", "mp3"),
        ("wav", "wav"),
        ("flac", "flac"),
        ("m4a", "m4a"),
        ("aac", "aac"),
    ];
    let subtype = mime_type.split('/').nth(1).unwrap_or("").to_ascii_lowercase();
    MAP.iter()
        .find(|(key, _)| subtype.contains(key))
        .map_or("webm", |(_, ext)| ext)
}

/// Mime type guessed from a file extension, for uploads from disk.
pub fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "ogg" | "oga" | "opus" => "audio/ogg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => "audio/webm",
    }
}

/// `Xh Ym Zs`, `Ym Zs` or `Zs` from seconds.  Fractions are dropped.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

/// First five words of the transcript, shortened when longer than 50 chars.
pub fn title_from_transcript(text: &str) -> String {
    let first_words = text
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    if first_words.is_empty() {
        return UNTITLED.to_string();
    }
    if first_words.chars().count() > TITLE_MAX_CHARS {
        let cut: String = first_words.chars().take(TITLE_CUT_CHARS).collect();
        return format!("{cut}...");
    }
    first_words
}

/// `March 3, 2026`
pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%B %-d, %Y").to_string()
}

/// `09:15 AM`
pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%I:%M %p").to_string()
}

/// Template variables for one finished run.
pub fn build_variables(
    now: DateTime<Utc>,
    transcription: &TranscriptionResult,
    document: Option<&FormattedDocument>,
    audio_path: &Path,
    transcript_path: &Path,
) -> TemplateVariables {
    let local = now.with_timezone(&Local);
    TemplateVariables {
        date: format_date(&local),
        time: format_time(&local),
        datetime: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        title: title_from_transcript(&transcription.text),
        duration: format_duration(transcription.duration),
        audio_path: audio_path.display().to_string(),
        transcript_path: transcript_path.display().to_string(),
        speaker_count: transcription.speaker_count,
        language: transcription.language.clone(),
        content: document.map_or_else(|| transcription.text.clone(), |d| d.content.clone()),
        summary: document.and_then(|d| d.summary.clone()),
        custom_fields: BTreeMap::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn stamp_replaces_separators_and_truncates() {
        assert_eq!(file_stamp(at("2026-03-03T09:15:07.123Z")), "2026-03-03T09-15-07");
    }

    #[test]
    fn mime_mapping() {
        assert_eq!(extension_for_mime("audio/webm;codecs=opus"), "webm");
        assert_eq!(extension_for_mime("audio/ogg"), "ogg");
        assert_eq!(extension_for_mime("audio/mp4"), "m4a");
        assert_eq!(extension_for_mime("audio/mpeg"), "mp3");
        assert_eq!(extension_for_mime("audio/wav"), "wav");
        assert_eq!(extension_for_mime("audio/x-wav"), "wav");
        assert_eq!(extension_for_mime("audio/x-m4a"), "m4a");
        assert_eq!(extension_for_mime("audio/aac"), "aac");
        assert_eq!(extension_for_mime("application/octet-stream"), "webm");
        assert_eq!(extension_for_mime(""), "webm");
    }

    #[test]
    fn upload_mime_guess_maps_back_to_extension() {
        for ext in ["webm", "ogg", "m4a", "aac", "mp3", "wav", "flac"] {
            let file = format!("clip.{ext}");
            assert_eq!(extension_for_mime(mime_for_extension(Path::new(&file))), ext);
        }
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(42.9), "42s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3723.0), "1h 2m 3s");
        assert_eq!(format_duration(f64::NAN), "0s");
    }

    #[test]
    fn titles() {
        assert_eq!(
            title_from_transcript("  okay so today we will discuss the roadmap"),
            "okay so today we will"
        );
        assert_eq!(title_from_transcript(""), "Untitled Recording");
        let long = "supercalifragilistic expialidocious antidisestablishment floccinaucinihilipilification x";
        let title = title_from_transcript(long);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 50);
    }

    #[test]
    fn date_and_time_formats() {
        let t = at("2026-03-03T21:05:00Z");
        assert_eq!(format_date(&t), "March 3, 2026");
        assert_eq!(format_time(&t), "09:05 PM");
    }
}
