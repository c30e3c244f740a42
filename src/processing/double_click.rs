//! Double-click detection used during replay
//!
//! Detection is informational only: a detected double click is logged and
//! counted, but the presses are still replayed one by one.

use crate::capture::input::types::{MouseButton, Position};
use crate::config::Configuration;
use std::collections::HashMap;

/// Remembers the last press of each button
#[derive(Debug, Clone)]
pub struct ClickMemory {
    threshold_secs: f64,
    max_distance: f64,
    last_presses: HashMap<MouseButton, (f64, Position)>,
}

impl ClickMemory {
    pub fn new(threshold_secs: f64, max_distance: f64) -> Self {
        Self {
            threshold_secs,
            max_distance,
            last_presses: HashMap::new(),
        }
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.double_click_threshold, config.double_click_distance)
    }

    pub fn reset(&mut self) {
        self.last_presses.clear();
    }

    /// True when a previous press of the same button happened strictly within
    /// the time threshold and strictly within the distance threshold.
    pub fn is_double_click(&self, button: MouseButton, position: Position, now: f64) -> bool {
        match self.last_presses.get(&button) {
            Some((last_time, last_position)) => {
                now - last_time < self.threshold_secs
                    && position.distance_to(last_position) < self.max_distance
            }
            None => false,
        }
    }

    pub fn remember(&mut self, button: MouseButton, position: Position, now: f64) {
        self.last_presses.insert(button, (now, position));
    }

    /// Check for a double click, then remember this press regardless of outcome
    pub fn register_press(&mut self, button: MouseButton, position: Position, now: f64) -> bool {
        let double = self.is_double_click(button, position, now);
        self.remember(button, position, now);
        double
    }
}
