//! Macro Recorder - record mouse and keyboard input, replay it later.
//!
//! Recording feeds OS input callbacks through a throttle into a
//! timestamped event log that is saved as JSON. Replay reads the file back
//! and re-issues every action with the recorded pacing, optionally faster.

pub mod capture;
pub mod clock;
pub mod commands;
pub mod config;
pub mod countdown;
pub mod error;
pub mod playback;
pub mod processing;
pub mod recorder;
pub mod storage;

pub use config::Configuration;
pub use error::{MacroError, MacroResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global log subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "macro_recorder=debug"
    } else {
        "macro_recorder=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
