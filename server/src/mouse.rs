//! Mouse state engine: button byte, relative motion, and the vertical and
//! horizontal wheel axes, plus the operations that mutate them and emit HID
//! reports.
//!
//! Grounded on `examples/original_source/app/input_service.py` for the
//! operation surface (`set_button`/`move`/`unpress_all_keys`) and on
//! `examples/original_source/app/hid/mouse.py` for the `DOWN` → sleep →
//! `UP` shape of a button press, though the ×32767 two-byte scaling that
//! file uses is superseded here by the ×10 five-byte form `spec.md` §9
//! calls authoritative.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::button::Button;
use crate::error::Error;
use crate::hid_writer::{HidWriter, ReportKind};

/// How long [`Mouse::set_button`] holds a button down for
/// [`crate::action::ButtonActionType::Press`], per `spec.md` §4.3.
pub const PRESS_HOLD: Duration = Duration::from_millis(150);

#[derive(Debug, Default, Clone, Copy)]
struct State {
    buttons: u8,
}

impl State {
    fn report(&self, dx: i8, dy: i8, vwheel: i8, hwheel: i8) -> [u8; 5] {
        [self.buttons, dx as u8, dy as u8, vwheel as u8, hwheel as u8]
    }
}

/// The mouse engine: owns button state behind a single lock covering
/// read-modify-emit.
pub struct Mouse {
    state: Mutex<State>,
    writer: Arc<HidWriter>,
}

impl Mouse {
    /// Builds a new engine bound to `writer`, with no buttons held.
    #[must_use]
    pub fn new(writer: Arc<HidWriter>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            writer,
        }
    }

    /// Sets or clears a button's bit and emits a zero-motion report
    /// reflecting the new button state.
    ///
    /// # Errors
    ///
    /// Propagates a write failure from the HID writer.
    pub fn set_button(&self, button: Button, down: bool) -> Result<(), Error> {
        let mut state = self.state.lock();
        if down {
            state.buttons |= button.bit();
        } else {
            state.buttons &= !button.bit();
        }
        self.emit(&state, 0, 0, 0, 0)
    }

    /// Presses and releases a button, holding for [`PRESS_HOLD`].
    ///
    /// # Errors
    ///
    /// Propagates a write failure.
    pub fn press_button(&self, button: Button) -> Result<(), Error> {
        self.set_button(button, true)?;
        thread::sleep(PRESS_HOLD);
        self.set_button(button, false)
    }

    /// Moves the cursor by `(x, y)` and scrolls by `(vwheel, hwheel)`,
    /// without changing button state.
    ///
    /// Each axis is scaled by 10, floored, and truncated to a signed byte;
    /// values outside `[-12.7, 12.7]` wrap rather than saturate, matching
    /// a native `i8 as` cast. The vertical wheel axis is negated before
    /// truncation so a positive `vwheel` scrolls the content up.
    ///
    /// # Errors
    ///
    /// Propagates a write failure.
    pub fn mov(&self, x: f64, y: f64, vwheel: f64, hwheel: f64) -> Result<(), Error> {
        let state = self.state.lock();
        self.emit(
            &state,
            scale(x),
            scale(y),
            scale(-vwheel),
            scale(hwheel),
        )
    }

    /// Releases every button and emits the zeroed report. Called on engine
    /// construction (implicitly) and on server shutdown.
    ///
    /// # Errors
    ///
    /// Propagates a write failure.
    pub fn release_all_buttons(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        *state = State::default();
        self.emit(&state, 0, 0, 0, 0)
    }

    fn emit(&self, state: &State, dx: i8, dy: i8, vwheel: i8, hwheel: i8) -> Result<(), Error> {
        self.writer
            .write(ReportKind::Mouse, &state.report(dx, dy, vwheel, hwheel))
    }
}

/// `floor(value * 10)` truncated to a signed byte, per `spec.md` §3/§4.3.
fn scale(value: f64) -> i8 {
    (value * 10.0).floor() as i64 as i8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid_writer::tests::RecordingSink;

    fn engine() -> (Arc<RecordingSink>, Mouse) {
        let sink = Arc::new(RecordingSink::default());
        let writer = Arc::new(HidWriter::with_sink(sink.clone()));
        (sink, Mouse::new(writer))
    }

    #[test]
    fn move_scenario_matches_expected_bytes() {
        let (sink, mouse) = engine();
        mouse.mov(0.5, -0.3, 0.0, 0.0).unwrap();
        assert_eq!(sink.last(ReportKind::Mouse).unwrap(), vec![0, 5, 0xFD, 0, 0]);
    }

    #[test]
    fn scale_wraps_outside_signed_byte_range() {
        assert_eq!(scale(12.7), 127);
        assert_eq!(scale(12.8), -128);
        assert_eq!(scale(-12.8), -128);
        assert_eq!(scale(-12.9), 127);
    }

    #[test]
    fn release_all_zeroes_buttons() {
        let (sink, mouse) = engine();
        mouse.set_button(Button::Left, true).unwrap();
        mouse.release_all_buttons().unwrap();
        assert_eq!(sink.last(ReportKind::Mouse).unwrap(), vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn press_button_scenario_holds_then_releases() {
        let (sink, mouse) = engine();
        mouse.press_button(Button::Left).unwrap();
        let writes = sink.writes(ReportKind::Mouse);
        assert_eq!(writes[writes.len() - 2], vec![Button::Left.bit(), 0, 0, 0, 0]);
        assert_eq!(writes[writes.len() - 1], vec![0, 0, 0, 0, 0]);
    }
}
