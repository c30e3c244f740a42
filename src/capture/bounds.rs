//! Normalization of raw OS callbacks
//!
//! Hooks report floating-point coordinates and their own button names.
//! `ScreenFilter` drops samples outside the configured screen, maps button
//! names onto `MouseButton` and forwards everything else to the sink.

use crate::capture::input::types::{MouseButton, Position};
use crate::config::Configuration;
use crate::recorder::channel::InputSink;
use std::sync::Arc;

#[derive(Clone)]
pub struct ScreenFilter {
    width: u32,
    height: u32,
    sink: Arc<dyn InputSink>,
}

impl ScreenFilter {
    pub fn new(width: u32, height: u32, sink: Arc<dyn InputSink>) -> Self {
        Self { width, height, sink }
    }

    pub fn from_config(config: &Configuration, sink: Arc<dyn InputSink>) -> Self {
        Self::new(config.screen_width, config.screen_height, sink)
    }

    /// Convert raw coordinates to a position inside the screen rectangle
    pub fn locate(&self, x: f64, y: f64) -> Option<Position> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (x, y) = (x.floor(), y.floor());
        if x < 0.0 || y < 0.0 || x >= f64::from(self.width) || y >= f64::from(self.height) {
            return None;
        }
        Some(Position::new(x as i32, y as i32))
    }

    pub fn handle_move(&self, x: f64, y: f64) {
        if let Some(position) = self.locate(x, y) {
            self.sink.on_move(position);
        }
    }

    pub fn handle_click(&self, x: f64, y: f64, raw_button: &str, pressed: bool) {
        let Some(position) = self.locate(x, y) else {
            return;
        };
        match raw_button.parse::<MouseButton>() {
            Ok(button) => self.sink.on_click(position, button, pressed),
            Err(e) => tracing::warn!("Dropping click sample: {}", e),
        }
    }

    /// Only the vertical delta is recorded
    pub fn handle_scroll(&self, x: f64, y: f64, _dx: i64, dy: i64) {
        if let Some(position) = self.locate(x, y) {
            let amount = dy.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
            self.sink.on_scroll(position, amount);
        }
    }

    pub fn handle_key(&self, name: &str, is_down: bool) {
        self.sink.on_key(name, is_down);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as ParkingMutex;

    #[derive(Default)]
    struct Collector {
        calls: ParkingMutex<Vec<String>>,
    }

    impl InputSink for Collector {
        fn on_move(&self, position: Position) {
            self.calls.lock().push(format!("move {}", position));
        }

        fn on_click(&self, position: Position, button: MouseButton, pressed: bool) {
            self.calls.lock().push(format!("click {} {} {}", position, button.name(), pressed));
        }

        fn on_scroll(&self, position: Position, amount: i32) {
            self.calls.lock().push(format!("scroll {} {}", position, amount));
        }

        fn on_key(&self, key: &str, pressed: bool) {
            self.calls.lock().push(format!("key {} {}", key, pressed));
        }
    }

    fn filter() -> (ScreenFilter, Arc<Collector>) {
        let collector = Arc::new(Collector::default());
        (ScreenFilter::new(1920, 1080, collector.clone()), collector)
    }

    #[test]
    fn test_in_bounds_samples_are_forwarded() {
        let (filter, collector) = filter();
        filter.handle_move(0.0, 0.0);
        filter.handle_move(1919.7, 1079.2);
        filter.handle_click(10.0, 20.0, "Button.right", true);
        filter.handle_scroll(5.0, 5.0, 0, -3);
        filter.handle_key("shift", false);

        assert_eq!(
            *collector.calls.lock(),
            vec![
                "move (0, 0)",
                "move (1919, 1079)",
                "click (10, 20) right true",
                "scroll (5, 5) -3",
                "key shift false",
            ]
        );
    }

    #[test]
    fn test_out_of_bounds_samples_are_dropped() {
        let (filter, collector) = filter();
        filter.handle_move(-1.0, 10.0);
        filter.handle_move(1920.0, 10.0);
        filter.handle_move(10.0, 1080.0);
        filter.handle_click(2000.0, 10.0, "Button.left", true);
        filter.handle_scroll(10.0, -0.5, 0, 1);
        filter.handle_move(f64::NAN, 10.0);

        assert!(collector.calls.lock().is_empty());
    }

    #[test]
    fn test_unknown_button_is_dropped_and_capture_continues() {
        let (filter, collector) = filter();
        filter.handle_click(10.0, 10.0, "Button.x2", true);
        filter.handle_click(10.0, 10.0, "Button.left", false);

        assert_eq!(*collector.calls.lock(), vec!["click (10, 10) left false"]);
    }
}
