//! Movement throttling applied while recording
//!
//! Pointer hardware reports far more samples than a replay needs. A sample is
//! kept only when it has moved far enough, or enough time has passed, since the
//! last kept sample. Dropped samples are gone for good.

use crate::capture::input::types::Position;
use crate::config::Configuration;

/// Decides which raw movement samples become recorded moves
#[derive(Debug, Clone)]
pub struct MoveThrottle {
    min_distance: f64,
    min_interval: f64,
    /// Last kept (position, time); `None` until the first sample after a reset
    reference: Option<(Position, f64)>,
}

impl MoveThrottle {
    pub fn new(min_distance: f64, min_interval: f64) -> Self {
        Self {
            min_distance,
            min_interval,
            reference: None,
        }
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.min_move_distance, config.min_move_time)
    }

    /// Forget the reference point; the next sample seeds it again
    pub fn reset(&mut self) {
        self.reference = None;
    }

    pub fn reference(&self) -> Option<(Position, f64)> {
        self.reference
    }

    /// Returns true when the sample should be recorded as a move.
    ///
    /// The first sample after a reset only seeds the reference point and is
    /// never recorded itself.
    pub fn accept(&mut self, position: Position, now: f64) -> bool {
        let Some((last_position, last_time)) = self.reference else {
            self.reference = Some((position, now));
            return false;
        };

        let distance = position.distance_to(&last_position);
        let elapsed = now - last_time;

        if distance > self.min_distance || elapsed > self.min_interval {
            self.reference = Some((position, now));
            true
        } else {
            false
        }
    }
}
