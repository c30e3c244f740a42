//! Recordable input model
//!
//! Value types for screen positions, mouse buttons and the set of events a
//! recording session can capture.

pub mod types;

pub use types::{MacroEvent, MouseButton, Position};
