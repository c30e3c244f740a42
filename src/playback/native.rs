//! Input injection through enigo

use super::output::OutputCapability;
use crate::capture::input::types::{MouseButton, Position};
use crate::error::{MacroError, MacroResult};
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use std::time::Duration;

/// Interval between intermediate cursor positions of a timed move
const MOVE_STEP: Duration = Duration::from_millis(5);

pub struct EnigoOutput {
    enigo: Enigo,
}

impl EnigoOutput {
    pub fn new() -> MacroResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| MacroError::PlatformError(format!("Failed to open input backend: {}", e)))?;
        tracing::info!("Native input backend ready");
        Ok(Self { enigo })
    }

    fn warp(&mut self, x: i32, y: i32) -> MacroResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| MacroError::PlatformError(format!("move to ({}, {}) failed: {}", x, y, e)))
    }

    fn button(&mut self, button: MouseButton, direction: Direction) -> MacroResult<()> {
        tracing::debug!("{} button {:?}", button.name(), direction);
        let native = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        };
        self.enigo
            .button(native, direction)
            .map_err(|e| MacroError::PlatformError(format!("{} button failed: {}", button.name(), e)))
    }

    fn key(&mut self, name: &str, direction: Direction) -> MacroResult<()> {
        let key = key_from_name(name)
            .ok_or_else(|| MacroError::PlatformError(format!("Unsupported key: {}", name)))?;
        tracing::debug!("key {} {:?}", name, direction);
        self.enigo
            .key(key, direction)
            .map_err(|e| MacroError::PlatformError(format!("key {} failed: {}", name, e)))
    }
}

impl OutputCapability for EnigoOutput {
    fn move_to(&mut self, position: Position, duration: Duration) -> MacroResult<()> {
        tracing::debug!("move to {} over {:?}", position, duration);
        let steps = (duration.as_secs_f64() / MOVE_STEP.as_secs_f64()).floor() as u32;
        if steps > 1 {
            if let Ok((x, y)) = self.enigo.location() {
                let start = Position::new(x, y);
                for step in 1..steps {
                    let point = start.lerp(&position, f64::from(step) / f64::from(steps));
                    self.warp(point.x, point.y)?;
                    std::thread::sleep(MOVE_STEP);
                }
            }
        }
        self.warp(position.x, position.y)
    }

    fn press_button(&mut self, button: MouseButton) -> MacroResult<()> {
        self.button(button, Direction::Press)
    }

    fn release_button(&mut self, button: MouseButton) -> MacroResult<()> {
        self.button(button, Direction::Release)
    }

    fn scroll(&mut self, amount: i32) -> MacroResult<()> {
        tracing::debug!("scroll by {}", amount);
        // Recorded amounts are positive upwards, enigo scrolls down for positive lengths
        self.enigo
            .scroll(-amount, Axis::Vertical)
            .map_err(|e| MacroError::PlatformError(format!("scroll failed: {}", e)))
    }

    fn press_key(&mut self, key: &str) -> MacroResult<()> {
        self.key(key, Direction::Press)
    }

    fn release_key(&mut self, key: &str) -> MacroResult<()> {
        self.key(key, Direction::Release)
    }
}

fn key_from_name(name: &str) -> Option<Key> {
    let key = match name {
        "ctrl" => Key::Control,
        "shift" => Key::Shift,
        "alt" => Key::Alt,
        "meta" => Key::Meta,
        "enter" => Key::Return,
        "space" => Key::Space,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "esc" => Key::Escape,
        "delete" => Key::Delete,
        "home" => Key::Home,
        "end" => Key::End,
        "page_up" => Key::PageUp,
        "page_down" => Key::PageDown,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "caps_lock" => Key::CapsLock,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => return None,
            }
        }
    };
    Some(key)
}
