//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the pipeline
//! as an immutable snapshot.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProviderConfig
// ---------------------------------------------------------------------------

/// Credential, model and endpoint for one LLM vendor.
///
/// Empty fields (as left by a partially hand-edited file) are filled from the
/// vendor defaults with [`ProviderConfig::merged_with`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key.  Empty string means "not configured".
    pub api_key: String,
    /// Model identifier sent to the vendor (e.g. `"gpt-4.1"`).
    pub model: String,
    /// Full endpoint URL.  For Google this is the models collection URL; the
    /// model name and `:generateContent` are appended per request.
    pub endpoint: String,
    /// Token ceiling used when a request does not specify its own.
    pub max_tokens: u32,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl ProviderConfig {
    fn vendor(model: &str, endpoint: &str) -> Self {
        Self {
            api_key: String::new(),
            model: model.into(),
            endpoint: endpoint.into(),
            max_tokens: 8192,
            timeout_secs: 120,
        }
    }

    /// `true` when a non-empty credential is set.
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Fill empty model / endpoint / ceiling fields from `fallback`.
    pub fn merged_with(&self, fallback: &ProviderConfig) -> ProviderConfig {
        let pick = |own: &str, other: &str| {
            if own.trim().is_empty() {
                other.to_string()
            } else {
                own.to_string()
            }
        };
        ProviderConfig {
            api_key: self.api_key.clone(),
            model: pick(&self.model, &fallback.model),
            endpoint: pick(&self.endpoint, &fallback.endpoint),
            max_tokens: if self.max_tokens == 0 {
                fallback.max_tokens
            } else {
                self.max_tokens
            },
            timeout_secs: if self.timeout_secs == 0 {
                fallback.timeout_secs
            } else {
                self.timeout_secs
            },
        }
    }
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

/// Settings for the LLM formatting step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Active provider id: `"anthropic"`, `"openai"`, `"google"` or `"xai"`.
    ///
    /// Kept as a plain string so a hand-edited settings file with an unknown
    /// vendor still loads; the formatter rejects it at run time.
    pub provider: String,
    /// Run the formatting stage after transcription.
    pub auto_format: bool,
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
    pub google: ProviderConfig,
    pub xai: ProviderConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".into(),
            auto_format: true,
            anthropic: ProviderConfig::vendor(
                "claude-sonnet-4-20250514",
                "https://api.anthropic.com/v1/messages",
            ),
            openai: ProviderConfig::vendor(
                "gpt-4.1",
                "https://api.openai.com/v1/chat/completions",
            ),
            google: ProviderConfig::vendor(
                "gemini-2.5-pro",
                "https://generativelanguage.googleapis.com/v1beta/models",
            ),
            xai: ProviderConfig::vendor("grok-3", "https://api.x.ai/v1/chat/completions"),
        }
    }
}

// ---------------------------------------------------------------------------
// TranscriptionConfig
// ---------------------------------------------------------------------------

/// Settings for the external speech-to-text tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Explicit path to the tool.  Empty means auto-detect.
    pub tool_path: String,
    /// Model the tool runs; recorded in transcription metadata.
    pub model: String,
    /// Host architecture the tool requires (`std::env::consts::ARCH` value).
    /// Empty disables the check.
    pub required_arch: String,
    /// Minimum interpreter version for the install strategies, `(major, minor)`.
    pub min_python: (u32, u32),
    /// Wall-clock ceiling for one transcription run.
    pub timeout_secs: u64,
    /// Ceiling for captured tool stdout, in bytes.
    pub max_output_bytes: usize,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            tool_path: String::new(),
            model: "mlx-community/Voxtral-Mini-4B-6bit".into(),
            required_arch: "aarch64".into(),
            min_python: (3, 8),
            timeout_secs: 600,
            max_output_bytes: 50 * 1024 * 1024,
        }
    }
}

impl TranscriptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Where audio and transcripts are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory all relative store paths resolve against.
    pub vault_root: PathBuf,
    /// Folder (relative to `vault_root`) for recordings and transcripts.
    pub recording_folder: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            vault_root: dirs::document_dir().unwrap_or_else(|| PathBuf::from(".")),
            recording_folder: "vmemo-recordings".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingConfig
// ---------------------------------------------------------------------------

/// Capture-phase limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Recording stops automatically once this many minutes have elapsed.
    pub max_duration_minutes: u64,
    /// Period of the duration tick, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_duration_minutes: 120,
            tick_interval_ms: 1000,
        }
    }
}

impl RecordingConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_minutes * 60)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

// ---------------------------------------------------------------------------
// TemplateConfig
// ---------------------------------------------------------------------------

/// A user-defined document template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    /// Formatting instructions; the default template's are used when absent.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Template selection and user templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Template id used for both formatting and rendering.
    pub default_template: String,
    /// User templates keyed by id.
    pub custom: BTreeMap<String, CustomTemplate>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            default_template: "meeting-notes".into(),
            custom: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// Persisted through [`SettingsStore`](crate::config::SettingsStore).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Verbose logging.
    pub debug_mode: bool,
    /// Storage locations.
    pub storage: StorageConfig,
    /// External speech-to-text tool settings.
    pub transcription: TranscriptionConfig,
    /// LLM formatting settings.
    pub ai: AiConfig,
    /// Template selection and user templates.
    pub templates: TemplateConfig,
    /// Capture-phase limits.
    pub recording: RecordingConfig,
}

impl AppConfig {
    /// Load from `path`.  A missing file yields the defaults (first run).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
