//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform directories, TOML persistence via
//! `AppConfig::load_from` / `AppConfig::save_to`, and the [`SettingsStore`]
//! that hands out immutable per-run snapshots.

pub mod paths;
pub mod settings;
pub mod store;

pub use paths::AppPaths;
pub use settings::{
    AiConfig, AppConfig, CustomTemplate, ProviderConfig, RecordingConfig, StorageConfig,
    TemplateConfig, TranscriptionConfig,
};
pub use store::SettingsStore;
