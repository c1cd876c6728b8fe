//! Input dispatcher: translates a typed command into the right engine
//! call, applying the cross-cutting rules (PRESS semantics, the mouse
//! motion deadline, hotkey playback timing) that don't belong to either
//! engine individually.
//!
//! Grounded on `examples/original_source/app/input_service.py`
//! (`InputService`, the layer above `HidKeyboardService` that the original
//! server handler calls into).

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::action::{ActionType, ButtonActionType, KeyOptions};
use crate::button::Button;
use crate::error::Error;
use crate::hotkey::{parse_hotkey, HotkeyStep};
use crate::key::Key;
use crate::keyboard::Keyboard;
use crate::mouse::Mouse;
use crate::timing::{with_timeout, DEFAULT_MOUSE_WAIT};

/// Input dispatcher, holding the keyboard/mouse engines and the default
/// inter-step delay hotkey playback falls back to when neither the step
/// nor the overall hotkey specifies one (mirrors `press_key`'s own hold
/// time, read live from `config.key_press_interval` per
/// `examples/original_source/app/input_service.py`).
pub struct Dispatcher {
    keyboard: Arc<Keyboard>,
    mouse: Arc<Mouse>,
    default_speed: Mutex<Duration>,
}

impl Dispatcher {
    /// Builds a dispatcher over the given engines. `default_speed` is the
    /// inter-step delay hotkey playback falls back to when a step doesn't
    /// set `speed_ms`.
    #[must_use]
    pub fn new(keyboard: Arc<Keyboard>, mouse: Arc<Mouse>, default_speed: Duration) -> Self {
        Self {
            keyboard,
            mouse,
            default_speed: Mutex::new(default_speed),
        }
    }

    /// Updates the configured key-press interval, reflecting a live
    /// `SetConfig` call: both the keyboard engine's own hold time and the
    /// hotkey-playback fallback delay move together, since the original
    /// reads `config.key_press_interval` fresh on every call rather than
    /// caching it.
    pub fn set_key_press_interval(&self, interval: Duration) {
        self.keyboard.set_key_press_interval(interval);
        *self.default_speed.lock() = interval;
    }

    /// Applies `action` to `key`, carrying `options` through unacted-upon
    /// (see `spec.md` §9's open question on `KeyOptions`).
    ///
    /// # Errors
    ///
    /// Propagates the keyboard engine's error.
    pub fn press_key(&self, key: Key, action: ActionType, _options: KeyOptions) -> Result<(), Error> {
        self.keyboard.apply(key, action)
    }

    /// Applies `action` to a mouse button.
    ///
    /// # Errors
    ///
    /// Propagates the mouse engine's error.
    pub fn press_mouse_key(&self, button: Button, action: ButtonActionType) -> Result<(), Error> {
        match action {
            ButtonActionType::Down => self.mouse.set_button(button, true),
            ButtonActionType::Up => self.mouse.set_button(button, false),
            ButtonActionType::Press => self.mouse.press_button(button),
            ButtonActionType::Move => Ok(()),
        }
    }

    /// Moves the cursor by `(x, y)`, scrolling by `(vwheel, hwheel)`,
    /// within [`DEFAULT_MOUSE_WAIT`]. A timeout is swallowed rather than
    /// surfaced: motion is best-effort, per `spec.md` §4.5/§5.
    ///
    /// # Errors
    ///
    /// Propagates the mouse engine's error if it completes in time.
    pub fn move_mouse(&self, x: f64, y: f64, vwheel: f64, hwheel: f64) -> Result<(), Error> {
        let mouse = Arc::clone(&self.mouse);
        let result = with_timeout(DEFAULT_MOUSE_WAIT, move || mouse.mov(x, y, vwheel, hwheel));
        match result {
            Some(Ok(())) => Ok(()),
            Some(Err(err)) => Err(err),
            None => Ok(()),
        }
    }

    /// Plays back a parsed hotkey sequence, or parses `raw` first if no
    /// pre-parsed steps are given.
    ///
    /// Each step's `wait_ms` is slept before the step is applied; a `PRESS`
    /// step is followed by `step.speed_ms` (falling back to
    /// `default_speed`) before the next step runs. Every step forces
    /// `no_repeat = true` regardless of what the caller's options said, so
    /// hotkey playback never triggers OS-level key repeat mid-sequence.
    ///
    /// # Errors
    ///
    /// Propagates a parse error from [`parse_hotkey`] or an engine error
    /// from any step.
    pub fn press_hotkey(&self, raw: &str) -> Result<(), Error> {
        let steps = parse_hotkey(raw)?;
        self.play(&steps)
    }

    /// Plays back already-parsed steps (used when a caller sends a
    /// `Hotkey` message with explicit steps rather than a raw string).
    ///
    /// # Errors
    ///
    /// Propagates an engine error from any step.
    pub fn play(&self, steps: &[HotkeyStep]) -> Result<(), Error> {
        for step in steps {
            if let Some(wait_ms) = step.wait_ms {
                thread::sleep(Duration::from_millis(u64::from(wait_ms)));
            }

            let options = KeyOptions {
                no_repeat: true,
                disable_unwanted_modifiers: false,
            };
            self.press_key(step.key, step.action, options)?;

            if step.action == ActionType::Press {
                let fallback = *self.default_speed.lock();
                let delay = step
                    .speed_ms
                    .map_or(fallback, |ms| Duration::from_millis(u64::from(ms)));
                thread::sleep(delay);
            }
        }
        Ok(())
    }

    /// Releases every held key, modifier, media key, and mouse button.
    /// Called on server shutdown after in-flight handlers finish, per
    /// `spec.md` §5/§9.
    ///
    /// # Errors
    ///
    /// Propagates the first engine error encountered.
    pub fn release_all(&self) -> Result<(), Error> {
        self.keyboard.release_all()?;
        self.mouse.release_all_buttons()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid_writer::tests::RecordingSink;
    use crate::hid_writer::{HidWriter, ReportKind};

    fn dispatcher() -> (Arc<RecordingSink>, Dispatcher) {
        let sink = Arc::new(RecordingSink::default());
        let writer = Arc::new(HidWriter::with_sink(sink.clone()));
        let keyboard = Arc::new(Keyboard::new(Arc::clone(&writer), Duration::from_millis(1)));
        let mouse = Arc::new(Mouse::new(writer));
        (sink, Dispatcher::new(keyboard, mouse, Duration::from_millis(1)))
    }

    #[test]
    fn press_key_routes_ordinary_key_to_keyboard_report() {
        let (sink, dispatcher) = dispatcher();
        dispatcher
            .press_key(Key::A, ActionType::Press, KeyOptions::default())
            .unwrap();
        assert!(sink.count(ReportKind::Keyboard) >= 2);
    }

    #[test]
    fn press_key_routes_media_key_to_consumer_report() {
        let (sink, dispatcher) = dispatcher();
        dispatcher
            .press_key(Key::VolumeUp, ActionType::Press, KeyOptions::default())
            .unwrap();
        assert!(sink.count(ReportKind::Consumer) >= 2);
    }

    #[test]
    fn press_mouse_key_move_is_a_no_op() {
        let (sink, dispatcher) = dispatcher();
        dispatcher
            .press_mouse_key(Button::Left, ButtonActionType::Move)
            .unwrap();
        assert_eq!(sink.count(ReportKind::Mouse), 0);
    }

    #[test]
    fn ctrl_c_hotkey_scenario_matches_expected_bytes() {
        let (sink, dispatcher) = dispatcher();
        dispatcher.press_hotkey("{Ctrl Down}c{Ctrl Up}").unwrap();
        let writes = sink.writes(ReportKind::Keyboard);
        assert_eq!(
            writes,
            vec![
                vec![0x01, 0, 0, 0, 0, 0, 0, 0],
                vec![0x01, 0, 0x06, 0, 0, 0, 0, 0],
                vec![0x01, 0, 0, 0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn brace_press_with_no_explicit_action_matches_down_then_up_bytes() {
        let (sink, dispatcher) = dispatcher();
        dispatcher.press_hotkey("{Ctrl}").unwrap();
        assert_eq!(
            sink.writes(ReportKind::Keyboard),
            vec![
                vec![0x01, 0, 0, 0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn hotkey_playback_forces_no_repeat_and_steps_through() {
        let (sink, dispatcher) = dispatcher();
        dispatcher.press_hotkey("{Ctrl Down}a{Ctrl Up}").unwrap();
        // Ctrl down, 'a' down+up, Ctrl up: four keyboard-report writes.
        assert_eq!(sink.count(ReportKind::Keyboard), 4);
    }

    #[test]
    fn set_key_press_interval_changes_future_hotkey_playback_speed() {
        let (sink, dispatcher) = dispatcher();
        dispatcher.set_key_press_interval(Duration::from_millis(0));
        dispatcher.press_hotkey("{Ctrl}").unwrap();
        // A zeroed interval still emits the down/up pair for the PRESS step.
        assert_eq!(sink.count(ReportKind::Keyboard), 2);
    }

    #[test]
    fn release_all_clears_both_engines() {
        let (sink, dispatcher) = dispatcher();
        dispatcher
            .press_key(Key::A, ActionType::Down, KeyOptions::default())
            .unwrap();
        dispatcher
            .press_mouse_key(Button::Left, ButtonActionType::Down)
            .unwrap();
        dispatcher.release_all().unwrap();
        assert_eq!(
            sink.last(ReportKind::Keyboard).unwrap(),
            vec![0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(sink.last(ReportKind::Mouse).unwrap(), vec![0, 0, 0, 0, 0]);
    }
}
