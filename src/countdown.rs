//! Pre-roll countdown shown before recording or replay starts

use crate::clock::Clock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Longest sleep between checks of the cancel flag
const TICK_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownMode {
    Record,
    Replay,
}

impl fmt::Display for CountdownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownMode::Record => write!(f, "Record"),
            CountdownMode::Replay => write!(f, "Replay"),
        }
    }
}

pub trait Countdown: Send + Sync {
    /// Block until the countdown has finished
    fn show(&self, mode: CountdownMode);

    /// Like `show`, but gives up early once `cancel` is raised.
    /// Returns false if the countdown was cancelled.
    fn show_until(&self, mode: CountdownMode, cancel: &AtomicBool) -> bool {
        self.show(mode);
        !cancel.load(Ordering::SeqCst)
    }
}

/// Counts down through the log, one line per second
pub struct TerminalCountdown {
    seconds: u64,
    clock: Arc<dyn Clock>,
}

impl TerminalCountdown {
    pub fn new(seconds: u64, clock: Arc<dyn Clock>) -> Self {
        Self { seconds, clock }
    }

    /// Sleep one second in slices. Returns false if cancelled meanwhile.
    fn tick(&self, cancel: &AtomicBool) -> bool {
        let mut remaining = Duration::from_secs(1);
        while !remaining.is_zero() {
            if cancel.load(Ordering::SeqCst) {
                return false;
            }
            let slice = remaining.min(TICK_SLICE);
            self.clock.sleep(slice);
            remaining -= slice;
        }
        true
    }
}

impl Countdown for TerminalCountdown {
    fn show(&self, mode: CountdownMode) {
        self.show_until(mode, &AtomicBool::new(false));
    }

    fn show_until(&self, mode: CountdownMode, cancel: &AtomicBool) -> bool {
        tracing::info!("{} will start in {} seconds...", mode, self.seconds);

        for remaining in (1..=self.seconds).rev() {
            tracing::info!("{}...", remaining);
            if !self.tick(cancel) {
                tracing::info!("{} countdown cancelled", mode);
                return false;
            }
        }

        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        match mode {
            CountdownMode::Record => tracing::info!("Recording has started"),
            CountdownMode::Replay => tracing::info!("Replay has started"),
        }
        true
    }
}

/// Skips the countdown entirely
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCountdown;

impl Countdown for NoCountdown {
    fn show(&self, _mode: CountdownMode) {}
}
