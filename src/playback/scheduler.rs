//! Replay scheduler
//!
//! Replays a macro file record by record on the calling thread. Each record
//! waits `time_diff / speed_factor` after the previous action was issued,
//! minus whatever time that action already took, then dispatches to the
//! output capability.

use crate::capture::input::types::{MouseButton, Position};
use crate::clock::Clock;
use crate::config::Configuration;
use crate::countdown::{Countdown, CountdownMode};
use crate::error::{MacroError, MacroResult};
use crate::playback::output::OutputCapability;
use crate::processing::double_click::ClickMemory;
use crate::processing::speed_skip::MoveSkipper;
use crate::storage::codec::{self, RecordBody};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Longest single sleep between cancellation checks
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Summary of one replay run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Records in the file
    pub total: usize,
    /// Records dispatched to the output capability
    pub executed: usize,
    /// Move records dropped by speed-based skipping
    pub skipped_moves: usize,
    /// Records that could not be decoded
    pub invalid_records: usize,
    pub double_clicks: usize,
    /// Replay stopped early because the cancel flag was raised
    pub cancelled: bool,
}

/// Plays back recorded macros
pub struct MacroPlayer {
    config: Configuration,
    output: Box<dyn OutputCapability>,
    countdown: Arc<dyn Countdown>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    clicks: ClickMemory,
    cancel: Arc<AtomicBool>,
    held_keys: BTreeSet<String>,
    held_buttons: HashSet<MouseButton>,
}

impl MacroPlayer {
    pub fn new(
        config: Configuration,
        output: Box<dyn OutputCapability>,
        countdown: Arc<dyn Countdown>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let clicks = ClickMemory::from_config(&config);
        Self {
            config,
            output,
            countdown,
            clock,
            rng: Box::new(StdRng::from_entropy()),
            clicks,
            cancel: Arc::new(AtomicBool::new(false)),
            held_keys: BTreeSet::new(),
            held_buttons: HashSet::new(),
        }
    }

    /// Replace the random source used for speed-based skipping
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Share an existing cancel flag, e.g. one owned by a signal handler
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that stops the replay when set. Once raised it stays raised, so
    /// later `play` calls on this player return immediately as cancelled.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Replay the macro stored at `path`.
    ///
    /// A file that cannot be loaded is reported before anything else happens:
    /// no countdown and no injected input.
    pub fn play(&mut self, path: &Path, speed_factor: f64) -> MacroResult<PlaybackReport> {
        if !speed_factor.is_finite() || speed_factor <= 0.0 {
            return Err(MacroError::InvalidSpeed(speed_factor));
        }

        let records = match codec::load(path) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Failed to load macro file: {}", e);
                return Err(e);
            }
        };

        let mut report = PlaybackReport {
            total: records.len(),
            ..PlaybackReport::default()
        };

        if !self.countdown.show_until(CountdownMode::Replay, &self.cancel) {
            return Ok(self.finish_cancelled(report));
        }
        tracing::info!("Replaying {} events at {}x speed...", records.len(), speed_factor);

        self.clicks.reset();
        self.held_keys.clear();
        self.held_buttons.clear();

        if !self.wait(self.config.replay_delay) {
            return Ok(self.finish_cancelled(report));
        }

        let mut skipper = MoveSkipper::new(speed_factor, self.config.max_skip_run);
        let mut last_action = self.clock.now();

        for (i, raw) in records.iter().enumerate() {
            if self.is_cancelled() {
                return Ok(self.finish_cancelled(report));
            }

            let record = match codec::decode_record(raw) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping record {}: {}", i, e);
                    report.invalid_records += 1;
                    continue;
                }
            };

            if record.is_move() && skipper.is_enabled() && skipper.should_skip(&mut *self.rng) {
                report.skipped_moves += 1;
                continue;
            }

            if i > 0 {
                let target = record.time_diff / speed_factor;
                let wait = target - (self.clock.now() - last_action);
                if !self.wait(wait) {
                    return Ok(self.finish_cancelled(report));
                }
            }

            last_action = self.clock.now();
            match self.execute(record.body, last_action) {
                Ok(double_click) => {
                    report.executed += 1;
                    if double_click {
                        report.double_clicks += 1;
                    }
                }
                Err(e) => {
                    tracing::error!("Replay failed at record {}: {}", i, e);
                    self.release_held();
                    return Err(e);
                }
            }
        }

        self.release_held();
        tracing::info!(
            "Replay complete. Replayed {} events ({} moves skipped).",
            report.executed,
            report.skipped_moves
        );
        Ok(report)
    }

    /// Sleep for `secs` in short slices. Returns false if cancelled.
    ///
    /// Zero, negative and unrepresentable waits proceed immediately.
    fn wait(&self, secs: f64) -> bool {
        let mut remaining = match Duration::try_from_secs_f64(secs) {
            Ok(duration) => duration,
            Err(_) => {
                if secs.is_nan() || secs > 0.0 {
                    tracing::warn!("Ignoring unrepresentable wait of {} seconds", secs);
                }
                Duration::ZERO
            }
        };

        while !remaining.is_zero() {
            if self.is_cancelled() {
                return false;
            }
            let slice = remaining.min(WAIT_SLICE);
            self.clock.sleep(slice);
            remaining -= slice;
        }
        !self.is_cancelled()
    }

    /// Dispatch one record. Returns true when it was a double-click press.
    fn execute(&mut self, body: RecordBody, now: f64) -> MacroResult<bool> {
        match body {
            RecordBody::Move { position, .. } => {
                self.output.move_to(position, self.config.move_duration())?;
            }
            RecordBody::Press {
                button, position, ..
            } => {
                let double_click = self.check_double_click(button, position, now);
                self.held_buttons.insert(button);
                self.output.press_button(button)?;
                return Ok(double_click);
            }
            RecordBody::Release { button, .. } => {
                self.held_buttons.remove(&button);
                self.output.release_button(button)?;
            }
            RecordBody::Scroll { scroll, .. } => {
                self.output.scroll(scroll)?;
            }
            RecordBody::Key {
                key, event_type, ..
            } => {
                if event_type.is_down() {
                    self.output.press_key(&key)?;
                    self.held_keys.insert(key);
                } else {
                    self.output.release_key(&key)?;
                    self.held_keys.remove(&key);
                }
            }
        }
        Ok(false)
    }

    fn check_double_click(&mut self, button: MouseButton, position: Position, now: f64) -> bool {
        let double_click = self.clicks.register_press(button, position, now);
        if double_click {
            tracing::info!("Double {} click detected at {}", button.name(), position);
        }
        double_click
    }

    /// Release whatever this replay pressed and never released
    fn release_held(&mut self) {
        for button in std::mem::take(&mut self.held_buttons) {
            if let Err(e) = self.output.release_button(button) {
                tracing::warn!("Could not release {} button: {}", button.name(), e);
            }
        }
        for key in std::mem::take(&mut self.held_keys) {
            tracing::debug!("Releasing held key {}", key);
            if let Err(e) = self.output.release_key(&key) {
                tracing::warn!("Could not release key {}: {}", key, e);
            }
        }
    }

    fn finish_cancelled(&mut self, mut report: PlaybackReport) -> PlaybackReport {
        tracing::info!("Replay interrupted after {} events, cleaning up...", report.executed);
        self.release_held();
        self.output.release_all_keys();
        report.cancelled = true;
        report
    }
}
