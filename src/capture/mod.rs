//! Input capture
//!
//! Event types shared by recording and replay, the screen-bounds filter that
//! normalizes raw hook callbacks, and the native hook when built with the
//! `native` feature.

pub mod bounds;
pub mod input;

#[cfg(feature = "native")]
pub mod native;

pub use bounds::ScreenFilter;
pub use input::{MacroEvent, MouseButton, Position};
