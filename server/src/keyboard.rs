//! Keyboard state engine: modifier byte, six-slot rollover array, and the
//! consumer (media) usage slot, plus the operations that mutate them and
//! emit HID reports.
//!
//! Grounded on `examples/original_source/app/input_service.py`
//! (`HidKeyboardService`) for the operation surface, and on the teacher's
//! `hid::Report`/`ReportType` for how a composite HID report is framed as
//! a fixed-size byte array.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::action::ActionType;
use crate::error::Error;
use crate::hid_writer::{HidWriter, ReportKind};
use crate::key::Key;

const NUM_SLOTS: usize = 6;

/// In-memory keyboard state: the modifier bitmask and the six-slot
/// non-modifier array. Zeroed at construction and whenever
/// [`Keyboard::release_all`] runs.
#[derive(Debug, Default, Clone, Copy)]
struct State {
    modifiers: u8,
    slots: [u8; NUM_SLOTS],
    media: u8,
}

impl State {
    /// The 8-byte boot-protocol keyboard report: `[mods, 0, slot0..slot5]`.
    fn keyboard_report(&self) -> [u8; 8] {
        let mut report = [0u8; 8];
        report[0] = self.modifiers;
        report[2..8].copy_from_slice(&self.slots);
        report
    }

    /// The 2-byte consumer report: `[usage_low, 0]`.
    fn consumer_report(&self) -> [u8; 2] {
        [self.media, 0]
    }

    /// Index of `usage` in `slots`, if present.
    fn slot_of(&self, usage: u8) -> Option<usize> {
        self.slots.iter().position(|&s| s == usage)
    }

    /// Index of the first empty (`0`) slot, if any.
    fn first_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(|&s| s == 0)
    }
}

/// The keyboard engine: owns keyboard state behind a single lock covering
/// read-modify-emit, so a concurrent caller never observes (or causes) a
/// torn report, per `spec.md` §9.
pub struct Keyboard {
    state: Mutex<State>,
    writer: Arc<HidWriter>,
    key_press_interval: Mutex<Duration>,
}

impl Keyboard {
    /// Builds a new engine bound to `writer`, zeroed, with an initial
    /// press-hold interval of `key_press_interval`.
    #[must_use]
    pub fn new(writer: Arc<HidWriter>, key_press_interval: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            writer,
            key_press_interval: Mutex::new(key_press_interval),
        }
    }

    /// Updates the interval [`Self::press_key`] and [`Self::press_media`]
    /// hold before releasing, reflecting a live config change.
    pub fn set_key_press_interval(&self, interval: Duration) {
        *self.key_press_interval.lock() = interval;
    }

    /// Sets or clears a modifier bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidModifier`] if `key` is not one of the eight
    /// modifier keys.
    pub fn set_modifier(&self, key: Key, down: bool) -> Result<(), Error> {
        let bit = key
            .modifier_bit()
            .ok_or(Error::InvalidModifier(key.id() as u8))?;
        let mut state = self.state.lock();
        if down {
            state.modifiers |= 1 << bit;
        } else {
            state.modifiers &= !(1 << bit);
        }
        self.emit_keyboard(&state)
    }

    /// Presses and releases a modifier, holding for the configured
    /// interval.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::InvalidModifier`] or a write failure.
    pub fn press_modifier(&self, key: Key) -> Result<(), Error> {
        self.set_modifier(key, true)?;
        thread::sleep(*self.key_press_interval.lock());
        self.set_modifier(key, false)
    }

    /// Sets or clears an ordinary (non-modifier, non-media) key's slot.
    ///
    /// Setting a key that is already held re-emits the report even though
    /// state is unchanged (idempotent but not silent, per `spec.md` §4.2).
    /// Clearing a key that isn't held is a no-op: no report is emitted.
    /// Slots are never compacted on release, so a later key can reuse the
    /// vacated index but existing neighbors keep their position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RolloverExceeded`] if `down` is `true` and all six
    /// slots are already occupied by a different usage code.
    pub fn set_key(&self, key: Key, down: bool) -> Result<(), Error> {
        let usage = key.keyboard_usage().unwrap_or(0);
        let mut state = self.state.lock();

        if down {
            if state.slot_of(usage).is_none() {
                let slot = state
                    .first_empty_slot()
                    .ok_or(Error::RolloverExceeded)?;
                state.slots[slot] = usage;
            }
            return self.emit_keyboard(&state);
        }

        let Some(slot) = state.slot_of(usage) else {
            return Ok(());
        };
        state.slots[slot] = 0;
        self.emit_keyboard(&state)
    }

    /// Presses and releases an ordinary key, holding for the configured
    /// interval.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::RolloverExceeded`] or a write failure.
    pub fn press_key(&self, key: Key) -> Result<(), Error> {
        self.set_key(key, true)?;
        thread::sleep(*self.key_press_interval.lock());
        self.set_key(key, false)
    }

    /// Sets or clears the single consumer-page media slot.
    ///
    /// # Errors
    ///
    /// Propagates a write failure from the HID writer.
    pub fn set_media(&self, key: Key, down: bool) -> Result<(), Error> {
        let usage = key.media_usage().unwrap_or(0);
        let mut state = self.state.lock();
        state.media = if down { usage } else { 0 };
        self.emit_consumer(&state)
    }

    /// Presses and releases a media key, holding for the configured
    /// interval.
    ///
    /// # Errors
    ///
    /// Propagates a write failure.
    pub fn press_media(&self, key: Key) -> Result<(), Error> {
        self.set_media(key, true)?;
        thread::sleep(*self.key_press_interval.lock());
        self.set_media(key, false)
    }

    /// Releases every modifier, ordinary key, and media key, and emits the
    /// zeroed reports. Called on engine construction (implicitly, the
    /// state already starts zeroed) and on server shutdown.
    ///
    /// # Errors
    ///
    /// Propagates a write failure.
    pub fn release_all(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        *state = State::default();
        self.emit_keyboard(&state)?;
        self.emit_consumer(&state)
    }

    fn emit_keyboard(&self, state: &State) -> Result<(), Error> {
        self.writer
            .write(ReportKind::Keyboard, &state.keyboard_report())
    }

    fn emit_consumer(&self, state: &State) -> Result<(), Error> {
        self.writer
            .write(ReportKind::Consumer, &state.consumer_report())
    }

    /// Action-type dispatch used by [`crate::dispatcher`]: routes by
    /// `key.partition()` to the modifier, media, or ordinary ops. `PRESS`
    /// holds for the configured interval; `DOWN`/`UP` set the held state
    /// immediately.
    ///
    /// # Errors
    ///
    /// Propagates whichever engine error the underlying op returns.
    pub fn apply(&self, key: Key, action: ActionType) -> Result<(), Error> {
        use crate::key::Partition;
        match (key.partition(), action) {
            (Partition::Modifier, ActionType::Down) => self.set_modifier(key, true),
            (Partition::Modifier, ActionType::Up) => self.set_modifier(key, false),
            (Partition::Modifier, ActionType::Press) => self.press_modifier(key),
            (Partition::Media, ActionType::Down) => self.set_media(key, true),
            (Partition::Media, ActionType::Up) => self.set_media(key, false),
            (Partition::Media, ActionType::Press) => self.press_media(key),
            (Partition::Ordinary, ActionType::Down) => self.set_key(key, true),
            (Partition::Ordinary, ActionType::Up) => self.set_key(key, false),
            (Partition::Ordinary, ActionType::Press) => self.press_key(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid_writer::tests::RecordingSink;

    fn engine() -> (Arc<RecordingSink>, Keyboard) {
        let sink = Arc::new(RecordingSink::default());
        let writer = Arc::new(HidWriter::with_sink(sink.clone()));
        (sink, Keyboard::new(writer, Duration::from_millis(1)))
    }

    #[test]
    fn set_key_then_clear_zeroes_report() {
        let (sink, kb) = engine();
        kb.set_key(Key::A, true).unwrap();
        kb.set_key(Key::A, false).unwrap();
        let last = sink.last(ReportKind::Keyboard).unwrap();
        assert_eq!(last, [0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn modifier_byte_is_or_of_held_bits() {
        let (_, kb) = engine();
        kb.set_modifier(Key::LControl, true).unwrap();
        kb.set_modifier(Key::LShift, true).unwrap();
        let report = kb.state.lock().keyboard_report();
        assert_eq!(report[0], 0b0000_0011);
    }

    #[test]
    fn seventh_key_is_rejected_without_mutating_state() {
        let (_, kb) = engine();
        let keys = [Key::A, Key::B, Key::C, Key::D, Key::E, Key::F];
        for key in keys {
            kb.set_key(key, true).unwrap();
        }
        let before = kb.state.lock().slots;
        let err = kb.set_key(Key::G, true).unwrap_err();
        assert!(matches!(err, Error::RolloverExceeded));
        assert_eq!(kb.state.lock().slots, before);
    }

    #[test]
    fn idempotent_set_key_down_still_emits() {
        let (sink, kb) = engine();
        kb.set_key(Key::A, true).unwrap();
        let count_before = sink.count(ReportKind::Keyboard);
        kb.set_key(Key::A, true).unwrap();
        assert_eq!(sink.count(ReportKind::Keyboard), count_before + 1);
    }

    #[test]
    fn clearing_absent_key_is_a_no_op() {
        let (sink, kb) = engine();
        let count_before = sink.count(ReportKind::Keyboard);
        kb.set_key(Key::A, false).unwrap();
        assert_eq!(sink.count(ReportKind::Keyboard), count_before);
    }

    #[test]
    fn release_all_zeroes_everything() {
        let (sink, kb) = engine();
        kb.set_modifier(Key::LShift, true).unwrap();
        kb.set_key(Key::A, true).unwrap();
        kb.set_media(Key::VolumeUp, true).unwrap();
        kb.release_all().unwrap();
        assert_eq!(
            sink.last(ReportKind::Keyboard).unwrap(),
            [0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(sink.last(ReportKind::Consumer).unwrap(), [0, 0]);
    }

    #[test]
    fn press_key_scenario_matches_interval() {
        let (sink, kb) = engine();
        kb.press_key(Key::A).unwrap();
        let writes = sink.writes(ReportKind::Keyboard);
        assert_eq!(writes[writes.len() - 2], [0, 0, 0x04, 0, 0, 0, 0, 0]);
        assert_eq!(writes[writes.len() - 1], [0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn volume_up_press_matches_scenario() {
        let (sink, kb) = engine();
        kb.press_media(Key::VolumeUp).unwrap();
        let writes = sink.writes(ReportKind::Consumer);
        assert_eq!(writes[writes.len() - 2], [0xE9, 0]);
        assert_eq!(writes[writes.len() - 1], [0, 0]);
    }
}
