//! Time sources for recording and replay
//!
//! Recording stamps events with `Clock::now` and replay paces itself with
//! `Clock::sleep`. `ManualClock` lets both run without real waiting.

use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Current time in seconds
    fn now(&self) -> f64;

    /// Block for the given duration
    fn sleep(&self, duration: Duration);
}

/// Seconds since the UNIX epoch, read once at construction and advanced by a
/// monotonic `Instant` afterwards, so wall-clock adjustments never move
/// timestamps backwards.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: f64,
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs_f64(),
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.epoch + self.origin.elapsed().as_secs_f64()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Manually advanced clock. `sleep` moves time forward instantly.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<ParkingMutex<f64>>,
    slept: Arc<ParkingMutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Arc::new(ParkingMutex::new(start)),
            slept: Arc::new(ParkingMutex::new(Vec::new())),
        }
    }

    pub fn set(&self, seconds: f64) {
        *self.now.lock() = seconds;
    }

    pub fn advance(&self, seconds: f64) {
        *self.now.lock() += seconds;
    }

    /// Every duration passed to `sleep`, in call order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().clone()
    }

    /// Total time spent in `sleep`
    pub fn total_slept(&self) -> Duration {
        self.slept.lock().iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
        *self.now.lock() += duration.as_secs_f64();
    }
}
