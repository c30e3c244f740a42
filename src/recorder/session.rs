//! Recording session
//!
//! Collects events delivered by an input channel into one ordered log.
//! Pointer and keyboard callbacks may arrive on different threads; every
//! append happens under a single lock and is stamped while holding it, so the
//! log stays in timestamp order with nothing lost or duplicated. The
//! recording flag lives under the same lock, so once `stop` returns no
//! callback can add to the log.

use crate::capture::input::types::{MacroEvent, MouseButton, Position};
use crate::clock::Clock;
use crate::config::Configuration;
use crate::countdown::{Countdown, CountdownMode};
use crate::error::{MacroError, MacroResult};
use crate::processing::throttle::MoveThrottle;
use crate::recorder::channel::{InputChannel, InputSink};
use crate::storage::codec::{self, SaveOutcome};
use parking_lot::Mutex as ParkingMutex;
use std::path::Path;
use std::sync::Arc;

struct SessionState {
    recording: bool,
    events: Vec<MacroEvent>,
    throttle: MoveThrottle,
}

/// Callback target shared with the input channel
pub struct SessionHandle {
    state: ParkingMutex<SessionState>,
    clock: Arc<dyn Clock>,
}

impl SessionHandle {
    fn new(throttle: MoveThrottle, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: ParkingMutex::new(SessionState {
                recording: false,
                events: Vec::new(),
                throttle,
            }),
            clock,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state.lock().recording
    }

    /// Clear the log and throttle and accept callbacks again
    fn begin(&self) {
        let mut state = self.state.lock();
        state.events.clear();
        state.throttle.reset();
        state.recording = true;
    }

    /// Stop accepting callbacks. Returns the size of the frozen log.
    fn freeze(&self) -> usize {
        let mut state = self.state.lock();
        state.recording = false;
        state.events.len()
    }

    fn append_with(&self, build: impl FnOnce(f64) -> MacroEvent) {
        let mut state = self.state.lock();
        if !state.recording {
            return;
        }
        let now = self.clock.now();
        state.events.push(build(now));
    }

    fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    fn snapshot(&self) -> Vec<MacroEvent> {
        self.state.lock().events.clone()
    }
}

impl InputSink for SessionHandle {
    fn on_move(&self, position: Position) {
        let mut state = self.state.lock();
        if !state.recording {
            return;
        }
        let now = self.clock.now();
        if state.throttle.accept(position, now) {
            state.events.push(MacroEvent::MouseMove {
                timestamp: now,
                position,
            });
        }
    }

    fn on_click(&self, position: Position, button: MouseButton, pressed: bool) {
        self.append_with(|timestamp| MacroEvent::MouseButton {
            timestamp,
            position,
            button,
            pressed,
        });
    }

    fn on_scroll(&self, position: Position, amount: i32) {
        self.append_with(|timestamp| MacroEvent::MouseScroll {
            timestamp,
            position,
            amount,
        });
    }

    fn on_key(&self, key: &str, pressed: bool) {
        let key = key.to_string();
        self.append_with(|timestamp| MacroEvent::Key {
            timestamp,
            key,
            pressed,
        });
    }
}

/// Records mouse and keyboard input from an input channel
pub struct RecordingSession {
    handle: Arc<SessionHandle>,
    input: Box<dyn InputChannel>,
    countdown: Arc<dyn Countdown>,
}

impl RecordingSession {
    pub fn new(
        config: &Configuration,
        input: Box<dyn InputChannel>,
        countdown: Arc<dyn Countdown>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            handle: Arc::new(SessionHandle::new(MoveThrottle::from_config(config), clock)),
            input,
            countdown,
        }
    }

    /// The callback target the input channel feeds
    pub fn handle(&self) -> Arc<SessionHandle> {
        self.handle.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.handle.is_recording()
    }

    /// Show the countdown, clear the log and start listening
    pub fn start(&mut self) -> MacroResult<()> {
        if self.handle.is_recording() {
            return Err(MacroError::AlreadyRecording);
        }

        self.countdown.show(CountdownMode::Record);
        tracing::info!("Recording started. Press Ctrl+C to stop.");

        self.handle.begin();

        let sink: Arc<dyn InputSink> = self.handle.clone();
        if let Err(e) = self.input.start(sink) {
            self.handle.freeze();
            return Err(e);
        }

        tracing::info!("Input channel '{}' listening", self.input.id());
        Ok(())
    }

    /// Stop listening and freeze the log. Returns the number of recorded events.
    ///
    /// Safe to call when recording never started or already stopped.
    pub fn stop(&mut self) -> MacroResult<usize> {
        let count = self.handle.freeze();

        if self.input.is_listening() {
            self.input.stop()?;
        }

        tracing::info!("Recording stopped. Recorded {} events.", count);
        Ok(count)
    }

    /// The recorded events, in order
    pub fn events(&self) -> Vec<MacroEvent> {
        self.handle.snapshot()
    }

    pub fn event_count(&self) -> usize {
        self.handle.len()
    }

    /// Persist the recorded events; an empty recording writes nothing
    pub fn save(&self, path: &Path) -> MacroResult<SaveOutcome> {
        codec::save(&self.events(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use crate::countdown::NoCountdown;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Input channel that records start/stop calls and never emits on its own
    #[derive(Clone, Default)]
    struct FakeChannel {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        listening: Arc<AtomicBool>,
    }

    impl InputChannel for FakeChannel {
        fn id(&self) -> &str {
            "fake"
        }

        fn start(&mut self, _sink: Arc<dyn InputSink>) -> MacroResult<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.listening.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) -> MacroResult<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.listening.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_listening(&self) -> bool {
            self.listening.load(Ordering::SeqCst)
        }
    }

    struct CountingCountdown(AtomicUsize);

    impl Countdown for CountingCountdown {
        fn show(&self, mode: CountdownMode) {
            assert_eq!(mode, CountdownMode::Record);
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session_with_clock(clock: Arc<dyn Clock>) -> (RecordingSession, FakeChannel) {
        let channel = FakeChannel::default();
        let session = RecordingSession::new(
            &Configuration::default(),
            Box::new(channel.clone()),
            Arc::new(NoCountdown),
            clock,
        );
        (session, channel)
    }

    #[test]
    fn test_start_shows_countdown_and_starts_channel() {
        let channel = FakeChannel::default();
        let countdown = Arc::new(CountingCountdown(AtomicUsize::new(0)));
        let mut session = RecordingSession::new(
            &Configuration::default(),
            Box::new(channel.clone()),
            countdown.clone(),
            Arc::new(SystemClock::new()),
        );

        session.start().unwrap();

        assert_eq!(countdown.0.load(Ordering::SeqCst), 1);
        assert_eq!(channel.starts.load(Ordering::SeqCst), 1);
        assert!(session.is_recording());
    }

    #[test]
    fn test_double_start_is_rejected() {
        let (mut session, _) = session_with_clock(Arc::new(SystemClock::new()));
        session.start().unwrap();
        assert!(matches!(session.start(), Err(MacroError::AlreadyRecording)));
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let (mut session, channel) = session_with_clock(Arc::new(SystemClock::new()));
        assert_eq!(session.stop().unwrap(), 0);
        assert_eq!(session.stop().unwrap(), 0);
        assert_eq!(channel.stops.load(Ordering::SeqCst), 0);
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_stop_twice_stops_channel_once() {
        let (mut session, channel) = session_with_clock(Arc::new(SystemClock::new()));
        session.start().unwrap();
        session.handle().on_key("a", true);

        assert_eq!(session.stop().unwrap(), 1);
        assert_eq!(session.stop().unwrap(), 1);
        assert_eq!(channel.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_move_is_reference_only() {
        let clock = ManualClock::new(100.0);
        let (mut session, _) = session_with_clock(Arc::new(clock.clone()));
        session.start().unwrap();
        let handle = session.handle();

        handle.on_move(Position::new(100, 200));
        assert!(session.events().is_empty());

        clock.advance(0.001);
        handle.on_move(Position::new(120, 200));
        assert_eq!(
            session.events(),
            vec![MacroEvent::MouseMove {
                timestamp: clock.now(),
                position: Position::new(120, 200)
            }]
        );
    }

    #[test]
    fn test_buttons_scrolls_and_keys_are_never_throttled() {
        let clock = ManualClock::new(0.0);
        let (mut session, _) = session_with_clock(Arc::new(clock));
        session.start().unwrap();
        let handle = session.handle();
        let p = Position::new(10, 10);

        handle.on_click(p, MouseButton::Left, true);
        handle.on_click(p, MouseButton::Left, false);
        handle.on_scroll(p, 1);
        handle.on_scroll(p, 1);
        handle.on_key("a", true);
        handle.on_key("a", false);

        let actions: Vec<&str> = session.events().iter().map(|e| e.action()).collect();
        assert_eq!(actions, vec!["press", "release", "scroll", "scroll", "key", "key"]);
    }

    #[test]
    fn test_callbacks_after_stop_are_ignored() {
        let (mut session, _) = session_with_clock(Arc::new(SystemClock::new()));
        session.start().unwrap();
        let handle = session.handle();
        handle.on_key("a", true);
        session.stop().unwrap();

        handle.on_key("b", true);
        handle.on_click(Position::new(1, 1), MouseButton::Left, true);
        assert_eq!(session.event_count(), 1);
    }

    #[test]
    fn test_callback_parked_on_lock_sees_stop() {
        let (mut session, _) = session_with_clock(Arc::new(SystemClock::new()));
        session.start().unwrap();
        let handle = session.handle();
        handle.on_key("early", true);

        let mut state = handle.state.lock();
        let late = {
            let handle = handle.clone();
            std::thread::spawn(move || handle.on_key("late", true))
        };
        // Let the callback block on the lock, then freeze the way stop does
        std::thread::sleep(Duration::from_millis(50));
        state.recording = false;
        drop(state);
        late.join().unwrap();

        assert_eq!(session.event_count(), 1);
        assert_eq!(session.stop().unwrap(), 1);
    }

    #[test]
    fn test_stop_count_matches_log_under_load() {
        let (mut session, _) = session_with_clock(Arc::new(SystemClock::new()));
        session.start().unwrap();
        let handle = session.handle();

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let handle = handle.clone();
                std::thread::spawn(move || {
                    for i in 0..2_000 {
                        handle.on_key(&format!("k{}-{}", t, i), true);
                    }
                })
            })
            .collect();

        std::thread::sleep(Duration::from_millis(1));
        let count = session.stop().unwrap();
        for writer in writers {
            writer.join().unwrap();
        }

        assert!(!session.is_recording());
        assert_eq!(session.events().len(), count);
    }

    #[test]
    fn test_start_clears_previous_recording() {
        let clock = ManualClock::new(0.0);
        let (mut session, _) = session_with_clock(Arc::new(clock.clone()));
        session.start().unwrap();
        let handle = session.handle();
        handle.on_move(Position::new(0, 0));
        clock.advance(1.0);
        handle.on_move(Position::new(0, 0));
        handle.on_key("a", true);
        session.stop().unwrap();
        assert_eq!(session.event_count(), 2);

        session.start().unwrap();
        assert_eq!(session.event_count(), 0);
        // Throttle was reset too: the next move only seeds the reference
        clock.advance(5.0);
        handle.on_move(Position::new(500, 500));
        assert_eq!(session.event_count(), 0);
    }

    #[test]
    fn test_concurrent_delivery_loses_nothing() {
        const PER_THREAD: usize = 500;
        let (mut session, _) = session_with_clock(Arc::new(SystemClock::new()));
        session.start().unwrap();

        // Each thread gets a shuffled mix of clicks, scrolls and key events
        let mut handles = Vec::new();
        for thread_id in 0..4u64 {
            let sink = session.handle();
            handles.push(std::thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(thread_id);
                let mut ops: Vec<usize> = (0..PER_THREAD).collect();
                ops.shuffle(&mut rng);
                for i in ops {
                    let p = Position::new(thread_id as i32, i as i32);
                    match i % 4 {
                        0 => sink.on_click(p, MouseButton::Left, true),
                        1 => sink.on_click(p, MouseButton::Left, false),
                        2 => sink.on_scroll(p, -1),
                        _ => sink.on_key(&format!("k{}-{}", thread_id, i), i % 2 == 0),
                    }
                    // Moves race against the other events; whatever passes the
                    // throttle is extra and checked separately below
                    sink.on_move(p);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        session.stop().unwrap();

        let events = session.events();
        let non_moves: Vec<&MacroEvent> = events.iter().filter(|e| !e.is_move()).collect();
        assert_eq!(non_moves.len(), 4 * PER_THREAD);

        // Every non-move sample shows up exactly once
        let mut seen = std::collections::HashSet::new();
        for event in &non_moves {
            let key = format!("{:?}", event_identity(event));
            assert!(seen.insert(key), "duplicate event {:?}", event);
        }

        // Appends are stamped under the lock, so order follows time
        for pair in events.windows(2) {
            assert!(pair[0].timestamp() <= pair[1].timestamp());
        }
    }

    fn event_identity(event: &MacroEvent) -> (String, Option<Position>, String) {
        match event {
            MacroEvent::Key { key, pressed, .. } => ("key".into(), None, format!("{}{}", key, pressed)),
            other => (other.action().into(), other.position(), String::new()),
        }
    }

    #[test]
    fn test_save_empty_session_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros").join("empty.json");
        let (session, _) = session_with_clock(Arc::new(SystemClock::new()));

        let outcome = session.save(&path).unwrap();
        assert_eq!(outcome, SaveOutcome::Skipped);
        assert!(!path.exists());
    }
}
