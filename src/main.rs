use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use macro_recorder::clock::SystemClock;
use macro_recorder::commands::{self, PlayOptions, RecordOptions};
use macro_recorder::countdown::{Countdown, NoCountdown, TerminalCountdown};
use macro_recorder::Configuration;
use std::path::PathBuf;
use std::sync::Arc;

/// Record mouse and keyboard input and replay it
#[derive(Parser, Debug)]
#[command(name = "macro-recorder")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Start immediately instead of counting down
    #[arg(long, global = true)]
    no_countdown: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record until Ctrl+C
    Record {
        /// Macro name, saved as <name>.json in the macros directory
        #[arg(short, long)]
        name: Option<String>,

        /// Replace an existing macro with the same name
        #[arg(long)]
        overwrite: bool,
    },

    /// Replay a recorded macro
    Play {
        /// Macro file (defaults to macro_actions.json in the macros directory)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Replay speed; above 1 some cursor moves are skipped
        #[arg(short, long, default_value_t = 1.0)]
        speed: f64,

        /// Log actions instead of injecting them
        #[arg(long)]
        dry_run: bool,
    },

    /// List recorded macros
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    macro_recorder::init_tracing(args.verbose);

    tracing::debug!("Starting macro-recorder v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Configuration::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };

    let countdown: Arc<dyn Countdown> = if args.no_countdown {
        Arc::new(NoCountdown)
    } else {
        Arc::new(TerminalCountdown::new(
            config.countdown_duration,
            Arc::new(SystemClock::new()),
        ))
    };

    match args.command {
        Command::Record { name, overwrite } => {
            commands::run_record(config, countdown, RecordOptions { name, overwrite }).await
        }
        Command::Play {
            file,
            speed,
            dry_run,
        } => {
            let report = commands::run_play(
                config,
                countdown,
                PlayOptions {
                    file,
                    speed,
                    dry_run,
                },
            )
            .await?;
            if report.cancelled {
                tracing::info!("Replay cancelled after {} events", report.executed);
            }
            Ok(())
        }
        Command::List => commands::run_list(&config),
    }
}
