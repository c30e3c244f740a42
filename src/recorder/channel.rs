//! Input channel traits
//!
//! An input channel is the OS-facing source of pointer and keyboard
//! callbacks. It pushes normalized callbacks into an `InputSink`, which is
//! usually a recording session.

use crate::capture::input::types::{MouseButton, Position};
use crate::error::MacroResult;
use std::sync::Arc;

/// Receives input callbacks, possibly from several threads at once
pub trait InputSink: Send + Sync {
    fn on_move(&self, position: Position);

    fn on_click(&self, position: Position, button: MouseButton, pressed: bool);

    /// `amount` is the vertical scroll in ticks
    fn on_scroll(&self, position: Position, amount: i32);

    fn on_key(&self, key: &str, pressed: bool);
}

/// Trait for input channels
///
/// `start` begins delivering callbacks into the sink; `stop` must be safe to
/// call at any time, including before `start` and more than once.
pub trait InputChannel: Send {
    /// Channel identifier for log output (e.g. "rdev")
    fn id(&self) -> &str;

    fn start(&mut self, sink: Arc<dyn InputSink>) -> MacroResult<()>;

    fn stop(&mut self) -> MacroResult<()>;

    fn is_listening(&self) -> bool;
}
