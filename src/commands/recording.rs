//! The `record` and `list` commands

use crate::clock::SystemClock;
use crate::config::Configuration;
use crate::countdown::Countdown;
use crate::error::{MacroError, MacroResult};
use crate::recorder::{InputChannel, RecordingSession};
use crate::storage::SaveOutcome;
use anyhow::Context;
use chrono::{DateTime, Local};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name used when none is given
pub const DEFAULT_MACRO_NAME: &str = "macro";

#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    pub name: Option<String>,
    pub overwrite: bool,
}

/// Letters, digits, `_`, `-`, `.` and spaces only
pub fn validate_macro_name(name: &str) -> MacroResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '));
    if valid {
        Ok(())
    } else {
        Err(MacroError::ConfigurationError(format!(
            "Invalid macro name '{}': use letters, digits, '_', '-', '.' and spaces",
            name
        )))
    }
}

/// Work out where a macro called `name` is saved.
///
/// `.json` is appended when missing. An existing file is only reused with
/// `overwrite`; otherwise the name gets a `_YYYYmmdd_HHMMSS` suffix.
pub fn resolve_macro_path(
    dir: &Path,
    name: Option<&str>,
    overwrite: bool,
    now: DateTime<Local>,
) -> MacroResult<PathBuf> {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(DEFAULT_MACRO_NAME);
    validate_macro_name(name)?;

    let file_name = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    };
    let path = dir.join(&file_name);

    if !path.exists() || overwrite {
        return Ok(path);
    }

    let stem = file_name.trim_end_matches(".json");
    let renamed = dir.join(format!("{}_{}.json", stem, now.format("%Y%m%d_%H%M%S")));
    tracing::info!(
        "{} already exists, saving as {}",
        path.display(),
        renamed.display()
    );
    Ok(renamed)
}

/// Macro files in `dir`, sorted by name. A missing directory has none.
pub fn list_macros(dir: &Path) -> MacroResult<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut macros = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            macros.push(path);
        }
    }
    macros.sort();
    Ok(macros)
}

/// Log the saved macros
pub fn run_list(config: &Configuration) -> anyhow::Result<()> {
    let macros = list_macros(&config.macros_dir)
        .with_context(|| format!("Failed to read {}", config.macros_dir.display()))?;

    if macros.is_empty() {
        tracing::info!("No macros in {}", config.macros_dir.display());
        return Ok(());
    }

    tracing::info!("Macros in {}:", config.macros_dir.display());
    for path in macros {
        if let Some(name) = path.file_name() {
            tracing::info!("  {}", name.to_string_lossy());
        }
    }
    Ok(())
}

/// Start `session`, wait for `stop`, then stop it again
pub async fn record_until<F>(session: RecordingSession, stop: F) -> anyhow::Result<RecordingSession>
where
    F: Future<Output = std::io::Result<()>>,
{
    // The countdown sleeps, keep it off the runtime threads
    let mut session = tokio::task::spawn_blocking(move || {
        let mut session = session;
        session.start().map(|()| session)
    })
    .await
    .context("Recording task panicked")??;

    let signal = stop.await;
    session.stop()?;
    signal.context("Failed to listen for Ctrl+C")?;
    Ok(session)
}

/// Record until Ctrl+C and save into the macros directory
pub async fn run_record(
    config: Configuration,
    countdown: Arc<dyn Countdown>,
    options: RecordOptions,
) -> anyhow::Result<()> {
    if let Some(name) = options.name.as_deref() {
        validate_macro_name(name.trim())?;
    }

    let input = native_input(&config)?;
    let session = RecordingSession::new(&config, input, countdown, Arc::new(SystemClock::new()));
    let session = record_until(session, tokio::signal::ctrl_c()).await?;

    release_modifier_keys();
    run_list(&config)?;

    let path = resolve_macro_path(
        &config.macros_dir,
        options.name.as_deref(),
        options.overwrite,
        Local::now(),
    )?;
    match session
        .save(&path)
        .with_context(|| format!("Failed to save {}", path.display()))?
    {
        SaveOutcome::Saved(count) => tracing::info!("Saved {} events to {}", count, path.display()),
        SaveOutcome::Skipped => tracing::info!("Nothing recorded, no file written"),
    }
    Ok(())
}

#[cfg(feature = "native")]
fn native_input(config: &Configuration) -> MacroResult<Box<dyn InputChannel>> {
    Ok(Box::new(crate::capture::native::RdevInput::from_config(config)))
}

#[cfg(not(feature = "native"))]
fn native_input(_config: &Configuration) -> MacroResult<Box<dyn InputChannel>> {
    Err(MacroError::PlatformError(
        "recording needs the global input hook; rebuild with --features native".to_string(),
    ))
}

/// Ctrl+C stops the recording while Ctrl is physically held, so release it
#[cfg(feature = "native")]
fn release_modifier_keys() {
    use crate::playback::OutputCapability;

    match crate::playback::native::EnigoOutput::new() {
        Ok(mut output) => output.release_all_keys(),
        Err(e) => tracing::warn!("Could not release modifier keys: {}", e),
    }
}

#[cfg(not(feature = "native"))]
fn release_modifier_keys() {}
