//! The `play` command

use crate::clock::SystemClock;
use crate::config::Configuration;
use crate::countdown::Countdown;
use crate::error::MacroResult;
use crate::playback::{LogOutput, MacroPlayer, OutputCapability, PlaybackReport};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// File replayed when `--file` is not given
pub const DEFAULT_MACRO_FILE: &str = "macro_actions.json";

#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub file: Option<PathBuf>,
    pub speed: f64,
    pub dry_run: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            file: None,
            speed: 1.0,
            dry_run: false,
        }
    }
}

/// Replay a macro until it finishes or Ctrl+C is pressed
pub async fn run_play(
    config: Configuration,
    countdown: Arc<dyn Countdown>,
    options: PlayOptions,
) -> anyhow::Result<PlaybackReport> {
    let path = options
        .file
        .unwrap_or_else(|| config.macros_dir.join(DEFAULT_MACRO_FILE));
    let cancel = Arc::new(AtomicBool::new(false));

    let flag = cancel.clone();
    let file = path.clone();
    let (speed, dry_run) = (options.speed, options.dry_run);

    // Output backends are not Send, so the player is built on the blocking thread
    let mut task = tokio::task::spawn_blocking(move || -> MacroResult<PlaybackReport> {
        let output = make_output(dry_run)?;
        let mut player = MacroPlayer::new(config, output, countdown, Arc::new(SystemClock::new()))
            .with_cancel_flag(flag);
        player.play(&file, speed)
    });

    let joined = tokio::select! {
        joined = &mut task => joined,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            } else {
                tracing::info!("Replay interrupted by user");
            }
            cancel.store(true, Ordering::SeqCst);
            task.await
        }
    };

    let report = joined
        .context("Replay task panicked")?
        .with_context(|| format!("Failed to replay {}", path.display()))?;

    if report.invalid_records > 0 {
        tracing::warn!("{} records could not be decoded", report.invalid_records);
    }
    Ok(report)
}

fn make_output(dry_run: bool) -> MacroResult<Box<dyn OutputCapability>> {
    if dry_run {
        return Ok(Box::new(LogOutput::new()));
    }

    #[cfg(feature = "native")]
    {
        Ok(Box::new(crate::playback::native::EnigoOutput::new()?))
    }

    #[cfg(not(feature = "native"))]
    {
        tracing::warn!("Built without the native feature, replaying as a dry run");
        Ok(Box::new(LogOutput::new()))
    }
}
