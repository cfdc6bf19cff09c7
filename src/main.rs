//! Command-line entry point for voice-memo.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Open the [`SettingsStore`] (defaults on first run).
//! 3. Initialise logging; `debug_mode` raises the default level to `debug`.
//! 4. Dispatch the subcommand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use voice_memo::{
    config::{AppConfig, SettingsStore},
    llm::{FormatterService, ProviderKind},
    pipeline::{
        mime_for_extension, AudioArtifact, AudioSource, CaptureError, LocalFileStore,
        PipelineOrchestrator, StageEvent,
    },
    templates::available_templates,
    transcription::ExternalToolManager,
};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "voice-memo", version, about = "Turn voice memos into markdown notes")]
struct Cli {
    /// Settings file to use instead of the platform default.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe and format an existing audio file into the vault.
    Upload {
        file: PathBuf,
        /// Template id for this run.
        #[arg(long)]
        template: Option<String>,
        /// Save the raw transcript without calling the AI provider.
        #[arg(long)]
        no_format: bool,
    },
    /// Report transcription tool, converter and provider readiness.
    Check,
    /// List built-in and custom templates.
    Templates,
    /// Show settings, or change the provider and its API key.
    Config {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        vault: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Capture stand-in
// ---------------------------------------------------------------------------

/// The CLI has no microphone; every run goes through `upload`.
struct NoCaptureDevice;

#[async_trait]
impl AudioSource for NoCaptureDevice {
    async fn start(&self) -> Result<(), CaptureError> {
        Err(CaptureError::NoDevice)
    }

    async fn stop(&self) -> Result<AudioArtifact, CaptureError> {
        Err(CaptureError::NoDevice)
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = match &cli.settings {
        Some(path) => SettingsStore::open(path),
        None => SettingsStore::open_default(),
    }
    .context("failed to load settings")?;

    let level = if store.snapshot().debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::debug!("voice-memo starting up");

    let store = Arc::new(store);
    match cli.command {
        Command::Upload {
            file,
            template,
            no_format,
        } => upload(store, &file, template, no_format).await,
        Command::Check => check(&store.snapshot()).await,
        Command::Templates => {
            list_templates(&store.snapshot());
            Ok(())
        }
        Command::Config {
            provider,
            api_key,
            vault,
        } => configure(&store, provider, api_key, vault),
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn upload(
    settings: Arc<SettingsStore>,
    file: &Path,
    template: Option<String>,
    no_format: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let artifact = AudioArtifact::new(bytes, mime_for_extension(file));

    // Per-run overrides stay out of the saved settings.
    let mut config = AppConfig::clone(&settings.snapshot());
    if let Some(id) = template {
        config.templates.default_template = id;
    }
    if no_format {
        config.ai.auto_format = false;
    }

    let files = LocalFileStore::from_config(&config);
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(SettingsStore::in_memory(config)),
        Arc::new(NoCaptureDevice),
        Arc::new(files),
        Arc::new(ExternalToolManager::system()),
        Arc::new(FormatterService::new()),
    );

    let mut events = orchestrator.subscribe();
    let progress = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                StageEvent::Status(status) => eprintln!("· {status}"),
                StageEvent::Failed(message) => eprintln!("✗ {message}"),
                StageEvent::Saved(_) | StageEvent::Tick(_) => {}
            }
        }
    });

    let result = orchestrator.upload_audio(artifact).await;
    drop(orchestrator);
    let _ = progress.await;

    let outcome = result?;
    println!("{}", outcome.transcript_path.display());
    if let Some(doc) = &outcome.document {
        log::info!(
            "{} via {} ({} tokens, {:.1}s)",
            doc.title,
            doc.metadata.model,
            doc.metadata.tokens_used,
            doc.metadata.processing_time.as_secs_f64()
        );
    }
    Ok(())
}

async fn check(config: &AppConfig) -> Result<()> {
    let tool = ExternalToolManager::system();

    match tool.ensure_available(&config.transcription).await {
        Ok(exe) => {
            let version = tool.version(&config.transcription).await.unwrap_or_default();
            println!("transcription tool: {exe} {version}");
        }
        Err(e) => println!("transcription tool: {e}"),
    }

    let ffmpeg = tool.bridge().converter_available().await;
    println!(
        "ffmpeg:             {}",
        if ffmpeg { "available" } else { "missing (brew install ffmpeg)" }
    );

    match config.ai.provider.parse::<ProviderKind>() {
        Ok(kind) => {
            let provider = kind.config_from(&config.ai);
            println!(
                "provider:           {} ({}, key {})",
                kind.display_name(),
                provider.model,
                if provider.has_credential() { "set" } else { "missing" }
            );
        }
        Err(e) => println!("provider:           {e}"),
    }

    println!("vault:              {}", config.storage.vault_root.display());
    Ok(())
}

fn list_templates(config: &AppConfig) {
    for info in available_templates(&config.templates) {
        let marker = if info.id == config.templates.default_template { "*" } else { " " };
        let origin = if info.built_in { "" } else { " (custom)" };
        println!("{marker} {:<16} {}{origin}", info.id, info.description);
    }
}

fn configure(
    store: &SettingsStore,
    provider: Option<String>,
    api_key: Option<String>,
    vault: Option<PathBuf>,
) -> Result<()> {
    if provider.is_none() && api_key.is_none() && vault.is_none() {
        let shown = masked(&store.snapshot());
        if let Some(path) = store.path() {
            println!("# {}", path.display());
        }
        print!("{}", toml::to_string_pretty(&shown)?);
        return Ok(());
    }

    let kind = match &provider {
        Some(id) => Some(id.parse::<ProviderKind>().map_err(anyhow::Error::msg)?),
        None => None,
    };
    let current = store.snapshot().ai.provider.parse::<ProviderKind>();
    if api_key.is_some() && kind.is_none() && current.is_err() {
        bail!("no valid provider selected; pass --provider");
    }

    store.update(|cfg| {
        if let Some(kind) = kind {
            cfg.ai.provider = kind.id().to_string();
        }
        if let Some(key) = api_key {
            let target = cfg
                .ai
                .provider
                .parse::<ProviderKind>()
                .unwrap_or(ProviderKind::Anthropic);
            let slot = match target {
                ProviderKind::Anthropic => &mut cfg.ai.anthropic,
                ProviderKind::OpenAi => &mut cfg.ai.openai,
                ProviderKind::Google => &mut cfg.ai.google,
                ProviderKind::Xai => &mut cfg.ai.xai,
            };
            slot.api_key = key;
        }
        if let Some(vault) = vault {
            cfg.storage.vault_root = vault;
        }
    })?;
    log::info!("settings saved");
    Ok(())
}

/// Copy of `config` with every API key reduced to its last four characters.
fn masked(config: &AppConfig) -> AppConfig {
    let mut shown = config.clone();
    for slot in [
        &mut shown.ai.anthropic,
        &mut shown.ai.openai,
        &mut shown.ai.google,
        &mut shown.ai.xai,
    ] {
        if slot.has_credential() {
            let tail: String = slot
                .api_key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            slot.api_key = format!("****{tail}");
        }
    }
    shown
}
