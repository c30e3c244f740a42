//! Output capability used by the replay scheduler

use crate::capture::input::types::{MouseButton, Position};
use crate::error::MacroResult;
use std::time::Duration;

/// Modifier keys released by the best-effort "all keys up" sweep
pub const SWEEP_KEYS: [&str; 4] = ["ctrl", "shift", "alt", "meta"];

/// Injects synthetic mouse and keyboard input
pub trait OutputCapability {
    fn move_to(&mut self, position: Position, duration: Duration) -> MacroResult<()>;

    fn press_button(&mut self, button: MouseButton) -> MacroResult<()>;

    fn release_button(&mut self, button: MouseButton) -> MacroResult<()>;

    /// Vertical scroll by `amount` ticks
    fn scroll(&mut self, amount: i32) -> MacroResult<()>;

    fn press_key(&mut self, key: &str) -> MacroResult<()>;

    fn release_key(&mut self, key: &str) -> MacroResult<()>;

    /// Best-effort release of every key this capability knows how to name.
    ///
    /// There is no way to ask the OS which keys it thinks are held, so this
    /// can miss keys; failures are logged and ignored.
    fn release_all_keys(&mut self) {
        for key in SWEEP_KEYS {
            if let Err(e) = self.release_key(key) {
                tracing::debug!("Could not release {}: {}", key, e);
            }
        }
    }
}

/// Logs actions instead of injecting them
#[derive(Debug, Default)]
pub struct LogOutput {
    actions: usize,
}

impl LogOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions logged so far
    pub fn actions(&self) -> usize {
        self.actions
    }
}

impl OutputCapability for LogOutput {
    fn move_to(&mut self, position: Position, duration: Duration) -> MacroResult<()> {
        self.actions += 1;
        tracing::info!("[dry-run] move to {} over {:?}", position, duration);
        Ok(())
    }

    fn press_button(&mut self, button: MouseButton) -> MacroResult<()> {
        self.actions += 1;
        tracing::info!("[dry-run] {} button pressed", button.name());
        Ok(())
    }

    fn release_button(&mut self, button: MouseButton) -> MacroResult<()> {
        self.actions += 1;
        tracing::info!("[dry-run] {} button released", button.name());
        Ok(())
    }

    fn scroll(&mut self, amount: i32) -> MacroResult<()> {
        self.actions += 1;
        tracing::info!("[dry-run] scroll by {}", amount);
        Ok(())
    }

    fn press_key(&mut self, key: &str) -> MacroResult<()> {
        self.actions += 1;
        tracing::info!("[dry-run] key pressed: {}", key);
        Ok(())
    }

    fn release_key(&mut self, key: &str) -> MacroResult<()> {
        self.actions += 1;
        tracing::info!("[dry-run] key released: {}", key);
        Ok(())
    }

    fn release_all_keys(&mut self) {
        tracing::info!("[dry-run] releasing modifier keys");
    }
}
