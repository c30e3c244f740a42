//! Timing heuristics applied during capture and replay
//!
//! This module contains the movement throttle used while recording, and the
//! double-click detection and speed-based move skipping used during replay.

pub mod double_click;
pub mod speed_skip;
pub mod throttle;

pub use double_click::ClickMemory;
pub use speed_skip::MoveSkipper;
pub use throttle::MoveThrottle;
