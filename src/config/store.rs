//! Process-wide settings store.
//!
//! The store owns the only mutable copy of [`AppConfig`].  Readers take an
//! immutable [`Arc`] snapshot; writers go through [`SettingsStore::update`],
//! which persists the new value and then swaps it in.  A pipeline run holds
//! the snapshot it captured at start, so edits made mid-run only affect the
//! next run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;

use super::{AppConfig, AppPaths};

/// Shared handle to the current settings.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<AppConfig>>,
}

impl SettingsStore {
    /// Open the store at the platform `settings.toml`.
    pub fn open_default() -> Result<Self> {
        Self::open(AppPaths::new().settings_file)
    }

    /// Open the store backed by `path`, loading it (or defaults when the
    /// file does not exist yet).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = AppConfig::load_from(&path)?;
        log::debug!("settings: loaded from {}", path.display());
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Immutable view of the settings as of now.
    pub fn snapshot(&self) -> Arc<AppConfig> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply `edit` to a copy of the current settings, persist it, then
    /// publish it.  On a persistence error nothing is published.
    pub fn update<F>(&self, edit: F) -> Result<Arc<AppConfig>>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = AppConfig::clone(&guard);
        edit(&mut next);

        if let Some(path) = &self.path {
            next.save_to(path)?;
        }

        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        Ok(next)
    }
}
