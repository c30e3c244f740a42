//! Global input hook backed by rdev
//!
//! rdev's `listen` blocks its thread forever and cannot be unhooked, so the
//! listener thread is spawned on the first `start` and lives for the rest of
//! the process. `stop` detaches the sink; callbacks arriving afterwards are
//! dropped.

use super::bounds::ScreenFilter;
use crate::config::Configuration;
use crate::error::{MacroError, MacroResult};
use crate::recorder::channel::{InputChannel, InputSink};
use parking_lot::Mutex as ParkingMutex;
use rdev::{Button, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Last known pointer position, stored as f64 bits.
/// Button and wheel events carry no coordinates of their own.
#[derive(Default)]
struct Pointer {
    x: AtomicU64,
    y: AtomicU64,
}

impl Pointer {
    fn store(&self, x: f64, y: f64) {
        self.x.store(x.to_bits(), Ordering::Relaxed);
        self.y.store(y.to_bits(), Ordering::Relaxed);
    }

    fn load(&self) -> (f64, f64) {
        (
            f64::from_bits(self.x.load(Ordering::Relaxed)),
            f64::from_bits(self.y.load(Ordering::Relaxed)),
        )
    }
}

pub struct RdevInput {
    width: u32,
    height: u32,
    target: Arc<ParkingMutex<Option<ScreenFilter>>>,
    listening: Arc<AtomicBool>,
    spawned: bool,
}

impl RdevInput {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            target: Arc::new(ParkingMutex::new(None)),
            listening: Arc::new(AtomicBool::new(false)),
            spawned: false,
        }
    }

    pub fn from_config(config: &Configuration) -> Self {
        let (width, height) = (config.screen_width, config.screen_height);
        match rdev::display_size() {
            Ok((w, h)) if (w, h) != (u64::from(width), u64::from(height)) => tracing::warn!(
                "Display reports {}x{} but the configured screen is {}x{}; samples outside it are dropped",
                w,
                h,
                width,
                height
            ),
            Ok(_) => {}
            Err(e) => tracing::debug!("Could not read display size: {:?}", e),
        }
        Self::new(width, height)
    }

    fn spawn_listener(&mut self) -> MacroResult<()> {
        let target = self.target.clone();
        let listening = self.listening.clone();
        let pointer = Arc::new(Pointer::default());

        std::thread::Builder::new()
            .name("rdev-listener".into())
            .spawn(move || {
                #[cfg(target_os = "macos")]
                rdev::set_is_main_thread(false);

                let callback = move |event: Event| {
                    if !listening.load(Ordering::SeqCst) {
                        return;
                    }
                    let guard = target.lock();
                    let Some(filter) = guard.as_ref() else {
                        return;
                    };
                    dispatch(filter, &pointer, event.event_type);
                };

                if let Err(e) = rdev::listen(callback) {
                    tracing::error!("Input hook failed: {:?}", e);
                }
            })
            .map_err(|e| MacroError::PlatformError(format!("Failed to spawn input hook: {}", e)))?;

        self.spawned = true;
        Ok(())
    }
}

impl InputChannel for RdevInput {
    fn id(&self) -> &str {
        "rdev"
    }

    fn start(&mut self, sink: Arc<dyn InputSink>) -> MacroResult<()> {
        *self.target.lock() = Some(ScreenFilter::new(self.width, self.height, sink));
        if !self.spawned {
            self.spawn_listener()?;
        }
        self.listening.store(true, Ordering::SeqCst);
        tracing::info!("Input hook attached ({}x{})", self.width, self.height);
        Ok(())
    }

    fn stop(&mut self) -> MacroResult<()> {
        self.listening.store(false, Ordering::SeqCst);
        self.target.lock().take();
        Ok(())
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

fn dispatch(filter: &ScreenFilter, pointer: &Pointer, event: EventType) {
    match event {
        EventType::MouseMove { x, y } => {
            pointer.store(x, y);
            filter.handle_move(x, y);
        }
        EventType::ButtonPress(button) => {
            let (x, y) = pointer.load();
            filter.handle_click(x, y, &button_name(button), true);
        }
        EventType::ButtonRelease(button) => {
            let (x, y) = pointer.load();
            filter.handle_click(x, y, &button_name(button), false);
        }
        EventType::Wheel { delta_x, delta_y } => {
            let (x, y) = pointer.load();
            filter.handle_scroll(x, y, delta_x, delta_y);
        }
        EventType::KeyPress(key) => filter.handle_key(&key_name(key), true),
        EventType::KeyRelease(key) => filter.handle_key(&key_name(key), false),
    }
}

fn button_name(button: Button) -> String {
    match button {
        Button::Left => "Button.left".to_string(),
        Button::Right => "Button.right".to_string(),
        Button::Middle => "Button.middle".to_string(),
        Button::Unknown(code) => format!("Button.unknown({})", code),
    }
}

/// Key name as stored in macro files
fn key_name(key: Key) -> String {
    let name = match key {
        Key::ControlLeft | Key::ControlRight => "ctrl",
        Key::ShiftLeft | Key::ShiftRight => "shift",
        Key::Alt | Key::AltGr => "alt",
        Key::MetaLeft | Key::MetaRight => "meta",
        Key::Return | Key::KpReturn => "enter",
        Key::Space => "space",
        Key::Tab => "tab",
        Key::Backspace => "backspace",
        Key::Escape => "esc",
        Key::Delete | Key::KpDelete => "delete",
        Key::Home => "home",
        Key::End => "end",
        Key::PageUp => "page_up",
        Key::PageDown => "page_down",
        Key::UpArrow => "up",
        Key::DownArrow => "down",
        Key::LeftArrow => "left",
        Key::RightArrow => "right",
        Key::CapsLock => "caps_lock",
        Key::F1 => "f1",
        Key::F2 => "f2",
        Key::F3 => "f3",
        Key::F4 => "f4",
        Key::F5 => "f5",
        Key::F6 => "f6",
        Key::F7 => "f7",
        Key::F8 => "f8",
        Key::F9 => "f9",
        Key::F10 => "f10",
        Key::F11 => "f11",
        Key::F12 => "f12",
        Key::Comma => ",",
        Key::Dot => ".",
        Key::SemiColon => ";",
        Key::Quote => "'",
        Key::BackQuote => "`",
        Key::Slash | Key::KpDivide => "/",
        Key::BackSlash => "\\",
        Key::LeftBracket => "[",
        Key::RightBracket => "]",
        Key::Minus | Key::KpMinus => "-",
        Key::Equal => "=",
        Key::KpPlus => "+",
        Key::KpMultiply => "*",
        other => return char_key(other).map(String::from).unwrap_or_else(|| format!("{:?}", other)),
    };
    name.to_string()
}

fn char_key(key: Key) -> Option<char> {
    let c = match key {
        Key::KeyA => 'a',
        Key::KeyB => 'b',
        Key::KeyC => 'c',
        Key::KeyD => 'd',
        Key::KeyE => 'e',
        Key::KeyF => 'f',
        Key::KeyG => 'g',
        Key::KeyH => 'h',
        Key::KeyI => 'i',
        Key::KeyJ => 'j',
        Key::KeyK => 'k',
        Key::KeyL => 'l',
        Key::KeyM => 'm',
        Key::KeyN => 'n',
        Key::KeyO => 'o',
        Key::KeyP => 'p',
        Key::KeyQ => 'q',
        Key::KeyR => 'r',
        Key::KeyS => 's',
        Key::KeyT => 't',
        Key::KeyU => 'u',
        Key::KeyV => 'v',
        Key::KeyW => 'w',
        Key::KeyX => 'x',
        Key::KeyY => 'y',
        Key::KeyZ => 'z',
        Key::Num0 | Key::Kp0 => '0',
        Key::Num1 | Key::Kp1 => '1',
        Key::Num2 | Key::Kp2 => '2',
        Key::Num3 | Key::Kp3 => '3',
        Key::Num4 | Key::Kp4 => '4',
        Key::Num5 | Key::Kp5 => '5',
        Key::Num6 | Key::Kp6 => '6',
        Key::Num7 | Key::Kp7 => '7',
        Key::Num8 | Key::Kp8 => '8',
        Key::Num9 | Key::Kp9 => '9',
        _ => return None,
    };
    Some(c)
}
