//! Recorder configuration
//!
//! Every field has a default, so a config file only needs the values it
//! wants to change.

use crate::error::{MacroError, MacroResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Screen width in pixels; pointer samples at or beyond it are dropped
    pub screen_width: u32,
    /// Screen height in pixels
    pub screen_height: u32,

    /// A move is recorded once the pointer travels further than this (px)
    pub min_move_distance: f64,
    /// ...or once this much time has passed since the last recorded move (s)
    pub min_move_time: f64,

    /// Two presses of one button closer than this in time (s)...
    pub double_click_threshold: f64,
    /// ...and in space (px) count as a double click
    pub double_click_distance: f64,

    /// Pause between the end of the countdown and the first replayed action (s)
    pub replay_delay: f64,
    /// Countdown length before recording or replay starts (s)
    pub countdown_duration: u64,
    /// Duration handed to the output capability for each cursor move (s)
    pub move_duration: f64,
    /// Upper bound on consecutive moves dropped by speed-based skipping
    pub max_skip_run: u32,

    /// Directory where named macros are stored
    pub macros_dir: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            min_move_distance: 5.0,
            min_move_time: 0.02,
            double_click_threshold: 0.3,
            double_click_distance: 5.0,
            replay_delay: 0.5,
            countdown_duration: 3,
            move_duration: 0.01,
            max_skip_run: 5,
            macros_dir: PathBuf::from("macros"),
        }
    }
}

impl Configuration {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> MacroResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MacroError::FileAbsent(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let config: Configuration = serde_json::from_str(&content).map_err(|e| {
            MacroError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make capture or replay meaningless
    pub fn validate(&self) -> MacroResult<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(MacroError::ConfigurationError(format!(
                "screen size must be non-zero, got {}x{}",
                self.screen_width, self.screen_height
            )));
        }

        let non_negative = [
            ("min_move_distance", self.min_move_distance),
            ("min_move_time", self.min_move_time),
            ("double_click_threshold", self.double_click_threshold),
            ("double_click_distance", self.double_click_distance),
            ("replay_delay", self.replay_delay),
            ("move_duration", self.move_duration),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(MacroError::ConfigurationError(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    pub fn move_duration(&self) -> Duration {
        Duration::from_secs_f64(self.move_duration)
    }
}
