use crate::error::MacroError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Screen position in integer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Point a fraction `t` of the way towards `to`, rounded to whole pixels
    pub fn lerp(&self, to: &Position, t: f64) -> Position {
        let step = |from: i32, to: i32| {
            let (from, to) = (f64::from(from), f64::from(to));
            (from + (to - from) * t).round() as i32
        };
        Position::new(step(self.x, to.x), step(self.y, to.y))
    }
}

impl From<[i32; 2]> for Position {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [i32; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Mouse buttons that can be recorded and replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    #[serde(rename = "Button.left")]
    Left,
    #[serde(rename = "Button.right")]
    Right,
    #[serde(rename = "Button.middle")]
    Middle,
}

impl MouseButton {
    /// Name used in macro files
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "Button.left",
            MouseButton::Right => "Button.right",
            MouseButton::Middle => "Button.middle",
        }
    }

    /// Short lowercase name for log output
    pub fn name(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

impl FromStr for MouseButton {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Button.left" => Ok(MouseButton::Left),
            "Button.right" => Ok(MouseButton::Right),
            "Button.middle" => Ok(MouseButton::Middle),
            other => Err(MacroError::UnknownMouseButton(other.to_string())),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded input event.
///
/// `timestamp` is in seconds and comes from the session clock, so values are
/// only comparable within one recording.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroEvent {
    MouseMove {
        timestamp: f64,
        position: Position,
    },
    MouseButton {
        timestamp: f64,
        position: Position,
        button: MouseButton,
        pressed: bool,
    },
    MouseScroll {
        timestamp: f64,
        position: Position,
        amount: i32,
    },
    Key {
        timestamp: f64,
        key: String,
        pressed: bool,
    },
}

impl MacroEvent {
    pub fn timestamp(&self) -> f64 {
        match self {
            MacroEvent::MouseMove { timestamp, .. }
            | MacroEvent::MouseButton { timestamp, .. }
            | MacroEvent::MouseScroll { timestamp, .. }
            | MacroEvent::Key { timestamp, .. } => *timestamp,
        }
    }

    /// The `action` name this event is stored under
    pub fn action(&self) -> &'static str {
        match self {
            MacroEvent::MouseMove { .. } => "move",
            MacroEvent::MouseButton { pressed: true, .. } => "press",
            MacroEvent::MouseButton { pressed: false, .. } => "release",
            MacroEvent::MouseScroll { .. } => "scroll",
            MacroEvent::Key { .. } => "key",
        }
    }

    /// Pointer position, if the event has one
    pub fn position(&self) -> Option<Position> {
        match self {
            MacroEvent::MouseMove { position, .. }
            | MacroEvent::MouseButton { position, .. }
            | MacroEvent::MouseScroll { position, .. } => Some(*position),
            MacroEvent::Key { .. } => None,
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, MacroEvent::MouseMove { .. })
    }
}
