//! Speed-based move skipping for fast replay
//!
//! Above 1x, each move record is dropped with probability `1 - 1/speed`, so
//! faster replays issue fewer intermediate cursor moves. A run of consecutive
//! drops is capped so the replayed path never loses too many samples in a row.

use rand::Rng;

#[derive(Debug, Clone)]
pub struct MoveSkipper {
    skip_probability: f64,
    max_run: usize,
    run: usize,
}

impl MoveSkipper {
    /// `max_skip_run` is the configured cap; the effective cap is
    /// `floor(min(max_skip_run, speed_factor))`. At or below 1x nothing is skipped.
    pub fn new(speed_factor: f64, max_skip_run: u32) -> Self {
        if !speed_factor.is_finite() || speed_factor <= 1.0 {
            return Self::disabled();
        }

        let max_run = f64::from(max_skip_run).min(speed_factor).floor() as usize;
        Self {
            skip_probability: 1.0 - 1.0 / speed_factor,
            max_run,
            run: 0,
        }
    }

    pub fn disabled() -> Self {
        Self {
            skip_probability: 0.0,
            max_run: 0,
            run: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_run > 0
    }

    pub fn max_run(&self) -> usize {
        self.max_run
    }

    /// Decide whether the next move record is skipped.
    ///
    /// Only call this for move records; anything else always executes and
    /// does not touch the run counter.
    pub fn should_skip<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.run < self.max_run && rng.gen::<f64>() < self.skip_probability {
            self.run += 1;
            true
        } else {
            self.run = 0;
            false
        }
    }
}
