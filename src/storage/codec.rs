//! Macro file format
//!
//! A macro file is a pretty-printed JSON array of records, one per event, in
//! recording order. Each record carries the event's fields under an `action`
//! tag plus `time_diff`, the seconds since the previous event. Replay pacing
//! uses `time_diff` as stored; the absolute `timestamp` is informational.
//!
//! ```json
//! [
//!   { "action": "move", "timestamp": 12.5, "position": [100, 200], "time_diff": 0.0 },
//!   { "action": "press", "timestamp": 12.75, "button": "Button.left", "position": [100, 200], "time_diff": 0.25 },
//!   { "action": "key", "timestamp": 13.0, "key": "a", "event_type": "down", "time_diff": 0.25 }
//! ]
//! ```

use crate::capture::input::types::{MacroEvent, MouseButton, Position};
use crate::error::{MacroError, MacroResult};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Key transition as written in macro files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDirection {
    Down,
    Up,
}

impl KeyDirection {
    pub fn from_pressed(pressed: bool) -> Self {
        if pressed {
            KeyDirection::Down
        } else {
            KeyDirection::Up
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, KeyDirection::Down)
    }
}

/// Event fields of one record, tagged by `action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RecordBody {
    Move {
        timestamp: f64,
        position: Position,
    },
    Press {
        timestamp: f64,
        button: MouseButton,
        position: Position,
    },
    Release {
        timestamp: f64,
        button: MouseButton,
        position: Position,
    },
    Scroll {
        timestamp: f64,
        position: Position,
        scroll: i32,
    },
    Key {
        timestamp: f64,
        key: String,
        event_type: KeyDirection,
    },
}

/// One entry of a macro file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    #[serde(flatten)]
    pub body: RecordBody,
    /// Seconds since the previous event; 0 for the first record
    pub time_diff: f64,
}

impl PersistedRecord {
    pub fn from_event(event: &MacroEvent, time_diff: f64) -> Self {
        let body = match event {
            MacroEvent::MouseMove { timestamp, position } => RecordBody::Move {
                timestamp: *timestamp,
                position: *position,
            },
            MacroEvent::MouseButton {
                timestamp,
                position,
                button,
                pressed: true,
            } => RecordBody::Press {
                timestamp: *timestamp,
                button: *button,
                position: *position,
            },
            MacroEvent::MouseButton {
                timestamp,
                position,
                button,
                pressed: false,
            } => RecordBody::Release {
                timestamp: *timestamp,
                button: *button,
                position: *position,
            },
            MacroEvent::MouseScroll {
                timestamp,
                position,
                amount,
            } => RecordBody::Scroll {
                timestamp: *timestamp,
                position: *position,
                scroll: *amount,
            },
            MacroEvent::Key {
                timestamp,
                key,
                pressed,
            } => RecordBody::Key {
                timestamp: *timestamp,
                key: key.clone(),
                event_type: KeyDirection::from_pressed(*pressed),
            },
        };
        Self { body, time_diff }
    }

    pub fn into_event(self) -> MacroEvent {
        match self.body {
            RecordBody::Move { timestamp, position } => MacroEvent::MouseMove { timestamp, position },
            RecordBody::Press {
                timestamp,
                button,
                position,
            } => MacroEvent::MouseButton {
                timestamp,
                position,
                button,
                pressed: true,
            },
            RecordBody::Release {
                timestamp,
                button,
                position,
            } => MacroEvent::MouseButton {
                timestamp,
                position,
                button,
                pressed: false,
            },
            RecordBody::Scroll {
                timestamp,
                position,
                scroll,
            } => MacroEvent::MouseScroll {
                timestamp,
                position,
                amount: scroll,
            },
            RecordBody::Key {
                timestamp,
                key,
                event_type,
            } => MacroEvent::Key {
                timestamp,
                key,
                pressed: event_type.is_down(),
            },
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self.body, RecordBody::Move { .. })
    }
}

/// Result of a save request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(usize),
    /// Nothing was recorded, so no file was written
    Skipped,
}

/// Build the on-disk records, computing each `time_diff` from the original
/// timestamps of consecutive events
pub fn to_records(events: &[MacroEvent]) -> Vec<PersistedRecord> {
    let mut previous = match events.first() {
        Some(first) => first.timestamp(),
        None => return Vec::new(),
    };

    events
        .iter()
        .map(|event| {
            let time_diff = event.timestamp() - previous;
            previous = event.timestamp();
            PersistedRecord::from_event(event, time_diff)
        })
        .collect()
}

/// Write events to `path`, creating parent directories as needed.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failed save never leaves a truncated macro behind.
pub fn save(events: &[MacroEvent], path: &Path) -> MacroResult<SaveOutcome> {
    if events.is_empty() {
        tracing::warn!("No events to save.");
        return Ok(SaveOutcome::Skipped);
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let records = to_records(events);
    let data = serde_json::to_vec_pretty(&records)
        .map_err(|e| MacroError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(&data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| {
        tracing::error!("Error saving to file {}: {}", path.display(), e.error);
        MacroError::IoError(e.error)
    })?;

    tracing::info!("Saved {} events to {}", records.len(), path.display());
    Ok(SaveOutcome::Saved(records.len()))
}

/// Read the raw records of a macro file without interpreting them.
///
/// A missing file and a file that is not valid JSON fail with different
/// errors (`FileAbsent` and `CorruptFormat`).
pub fn load(path: &Path) -> MacroResult<Vec<serde_json::Value>> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!("File not found: {}", path.display());
            return Err(MacroError::FileAbsent(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let records: Vec<serde_json::Value> = serde_json::from_slice(&data).map_err(|source| {
        tracing::error!("Invalid JSON in file: {}", path.display());
        MacroError::CorruptFormat {
            path: path.to_path_buf(),
            source,
        }
    })?;

    tracing::info!("Loaded {} events from {}", records.len(), path.display());
    Ok(records)
}

/// Interpret one raw record
pub fn decode_record(raw: &serde_json::Value) -> MacroResult<PersistedRecord> {
    PersistedRecord::deserialize(raw).map_err(|e| MacroError::InvalidRecord(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_events() -> Vec<MacroEvent> {
        vec![
            MacroEvent::MouseMove {
                timestamp: 10.0,
                position: Position::new(100, 200),
            },
            MacroEvent::MouseButton {
                timestamp: 10.25,
                position: Position::new(100, 200),
                button: MouseButton::Left,
                pressed: true,
            },
            MacroEvent::MouseButton {
                timestamp: 10.375,
                position: Position::new(101, 200),
                button: MouseButton::Left,
                pressed: false,
            },
            MacroEvent::MouseScroll {
                timestamp: 11.0,
                position: Position::new(101, 200),
                amount: -2,
            },
            MacroEvent::Key {
                timestamp: 11.5,
                key: "a".to_string(),
                pressed: true,
            },
            MacroEvent::Key {
                timestamp: 11.5,
                key: "a".to_string(),
                pressed: false,
            },
        ]
    }

    #[test]
    fn test_save_empty_is_skipped_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        assert_eq!(save(&[], &path).unwrap(), SaveOutcome::Skipped);
        assert!(!path.exists());
    }

    #[test]
    fn test_field_mapping_matches_wire_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macro.json");
        save(&sample_events(), &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            json!([
                { "action": "move", "timestamp": 10.0, "position": [100, 200], "time_diff": 0.0 },
                { "action": "press", "timestamp": 10.25, "button": "Button.left", "position": [100, 200], "time_diff": 0.25 },
                { "action": "release", "timestamp": 10.375, "button": "Button.left", "position": [101, 200], "time_diff": 0.125 },
                { "action": "scroll", "timestamp": 11.0, "position": [101, 200], "scroll": -2, "time_diff": 0.625 },
                { "action": "key", "timestamp": 11.5, "key": "a", "event_type": "down", "time_diff": 0.5 },
                { "action": "key", "timestamp": 11.5, "key": "a", "event_type": "up", "time_diff": 0.0 },
            ])
        );
    }

    #[test]
    fn test_output_is_indented_and_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        save(&sample_events(), &a).unwrap();
        save(&sample_events(), &b).unwrap();

        let a = std::fs::read_to_string(a).unwrap();
        let b = std::fs::read_to_string(b).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("[\n  {\n    \"action\": \"move\""));
    }

    #[test]
    fn test_time_diff_uses_original_timestamps() {
        let records = to_records(&sample_events());
        let diffs: Vec<f64> = records.iter().map(|r| r.time_diff).collect();
        assert_eq!(diffs, vec![0.0, 0.25, 0.125, 0.625, 0.5, 0.0]);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros").join("nested").join("m.json");

        assert_eq!(save(&sample_events(), &path).unwrap(), SaveOutcome::Saved(6));
        assert!(path.exists());
    }

    #[test]
    fn test_save_failure_is_reported_and_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("m.json");

        let err = save(&sample_events(), &path).unwrap_err();
        assert!(matches!(err, MacroError::IoError(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_absent_and_corrupt_are_distinct() {
        let dir = tempfile::tempdir().unwrap();

        let absent = load(&dir.path().join("missing.json")).unwrap_err();
        assert!(absent.is_absent());
        assert!(!absent.is_corrupt());

        let corrupt_path = dir.path().join("corrupt.json");
        std::fs::write(&corrupt_path, "[{\"action\": \"move\",").unwrap();
        let corrupt = load(&corrupt_path).unwrap_err();
        assert!(corrupt.is_corrupt());
        assert!(!corrupt.is_absent());
    }

    #[test]
    fn test_load_rejects_non_array_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("object.json");
        std::fs::write(&path, "{\"action\": \"move\"}").unwrap();

        assert!(load(&path).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_round_trip_preserves_events_and_deltas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macro.json");
        let events = sample_events();
        save(&events, &path).unwrap();

        let records: Vec<PersistedRecord> = load(&path)
            .unwrap()
            .iter()
            .map(|raw| decode_record(raw).unwrap())
            .collect();
        assert_eq!(records.len(), events.len());

        let expected_diffs: Vec<f64> = to_records(&events).iter().map(|r| r.time_diff).collect();
        let loaded_diffs: Vec<f64> = records.iter().map(|r| r.time_diff).collect();
        assert_eq!(loaded_diffs, expected_diffs);

        let decoded: Vec<MacroEvent> = records.into_iter().map(PersistedRecord::into_event).collect();
        assert_eq!(decoded, events);
    }

    #[test]
    fn test_stored_time_diff_is_trusted_on_load() {
        let raw = json!({ "action": "move", "timestamp": 1.0, "position": [0, 0], "time_diff": 42.0 });
        let record = decode_record(&raw).unwrap();
        assert_eq!(record.time_diff, 42.0);
    }

    #[test]
    fn test_decode_rejects_bad_records() {
        let bad = [
            json!({ "action": "teleport", "timestamp": 1.0, "time_diff": 0.0 }),
            json!({ "action": "press", "timestamp": 1.0, "button": "Button.x1", "position": [0, 0], "time_diff": 0.0 }),
            json!({ "action": "move", "timestamp": 1.0, "time_diff": 0.0 }),
            json!({ "action": "key", "timestamp": 1.0, "key": "a", "event_type": "sideways", "time_diff": 0.0 }),
            json!({ "action": "move", "timestamp": 1.0, "position": [0, 0] }),
            json!("move"),
        ];
        for raw in bad {
            let err = decode_record(&raw).unwrap_err();
            assert!(matches!(err, MacroError::InvalidRecord(_)), "accepted {}", raw);
        }
    }
}
