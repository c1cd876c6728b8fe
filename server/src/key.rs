//! The abstract `Key` identifier and its mapping onto USB HID usage codes.
//!
//! Grounded on `examples/original_source/app/key.py` (the closed
//! enumeration and its stable integer ids, carried unchanged so the wire
//! `id` field matches the original source) and on
//! `examples/original_source/app/key_utils.py` /
//! `examples/original_source/app/key_to_keycode.py` for the
//! `Key -> HID usage` table. Usage codes come from the USB HID Usage
//! Tables: page `0x07` (Keyboard/Keypad) for ordinary keys and modifiers,
//! page `0x0C` (Consumer) for media keys.

/// Which of the three wire partitions a [`Key`] belongs to.
///
/// Mirrors the teacher's habit of modeling a small closed set of cases as a
/// tagged enum (see `input::Key`/`DirectionalPad` in the teacher) rather
/// than interface polymorphism, per `spec.md` §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// One of the eight modifier keys (left/right shift, control, alt, meta).
    Modifier,
    /// A consumer-page media/browser key.
    Media,
    /// An ordinary keyboard-page key, reported in the six-slot array.
    Ordinary,
}

/// The closed set of input keys the server understands, carrying the same
/// stable integer ids as `examples/original_source/app/key.py` so RPC
/// callers can use the same `id` values as the original implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum Key {
    Key0 = 0,
    Key1 = 1,
    Key2 = 2,
    Key3 = 3,
    Key4 = 4,
    Key5 = 5,
    Key6 = 6,
    Key7 = 7,
    Key8 = 8,
    Key9 = 9,
    A = 10,
    B = 11,
    C = 12,
    D = 13,
    E = 14,
    F = 15,
    G = 16,
    H = 17,
    I = 18,
    J = 19,
    K = 20,
    L = 21,
    M = 22,
    N = 23,
    O = 24,
    P = 25,
    Q = 26,
    R = 27,
    S = 28,
    T = 29,
    U = 30,
    V = 31,
    W = 32,
    X = 33,
    Y = 34,
    Z = 35,
    F1 = 36,
    F2 = 37,
    F3 = 38,
    F4 = 39,
    F5 = 40,
    F6 = 41,
    F7 = 42,
    F8 = 43,
    F9 = 44,
    F10 = 45,
    F11 = 46,
    F12 = 47,
    NumLock = 48,
    Scroll = 49,
    Back = 50,
    Tab = 51,
    Return = 52,
    LShift = 53,
    RShift = 54,
    LControl = 55,
    RControl = 56,
    LMenu = 57,
    RMenu = 58,
    Capital = 59,
    Escape = 60,
    Convert = 61,
    NonConvert = 62,
    Accept = 63,
    ModeChange = 64,
    Space = 65,
    Prior = 66,
    Next = 67,
    End = 68,
    Home = 69,
    Left = 70,
    Up = 71,
    Right = 72,
    Down = 73,
    Select = 74,
    Print = 75,
    Execute = 76,
    Snapshot = 77,
    Insert = 78,
    Delete = 79,
    Help = 80,
    LSuper = 81,
    RSuper = 82,
    Apps = 83,
    Sleep = 84,
    Numpad0 = 85,
    Numpad1 = 86,
    Numpad2 = 87,
    Numpad3 = 88,
    Numpad4 = 89,
    Numpad5 = 90,
    Numpad6 = 91,
    Numpad7 = 92,
    Numpad8 = 93,
    Numpad9 = 94,
    Multiply = 95,
    Add = 96,
    Separator = 97,
    Subtract = 98,
    Decimal = 99,
    Divide = 100,
    OemPlus = 101,
    OemComma = 102,
    OemMinus = 103,
    OemPeriod = 104,
    Oem1Semicolon = 105,
    Oem2ForwardSlash = 106,
    Oem3Backtick = 107,
    Oem4SquareBracketOpen = 108,
    Oem5Backslash = 109,
    Oem6SquareBracketClose = 110,
    Oem7SingleQuote = 111,
    MediaPlayPause = 112,
    MediaPrevTrack = 113,
    MediaNextTrack = 114,
    VolumeMute = 115,
    VolumeUp = 116,
    VolumeDown = 117,
    MediaStop = 118,
    BrowserBack = 119,
    BrowserForward = 120,
    BrowserRefresh = 121,
}

/// Total number of distinct [`Key`] values, for exhaustive-table tests.
pub const KEY_COUNT: usize = 122;

impl Key {
    /// The stable wire identifier for this key.
    #[must_use]
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Resolves a wire identifier back into a [`Key`].
    #[must_use]
    pub fn from_id(id: u16) -> Option<Self> {
        ALL.get(usize::from(id)).copied()
    }

    /// Which wire partition this key belongs to.
    #[must_use]
    pub fn partition(self) -> Partition {
        if self.modifier_bit().is_some() {
            Partition::Modifier
        } else if self.media_usage().is_some() {
            Partition::Media
        } else {
            Partition::Ordinary
        }
    }

    /// Whether this key is one of the eight modifier keys.
    #[must_use]
    pub fn is_modifier(self) -> bool {
        matches!(self.partition(), Partition::Modifier)
    }

    /// Whether this key is a consumer-page media key.
    #[must_use]
    pub fn is_media(self) -> bool {
        matches!(self.partition(), Partition::Media)
    }

    /// The modifier bitmask bit (0-7) this key sets, if it is a modifier.
    ///
    /// Bit order follows the USB HID boot modifier byte: bit 0 is left
    /// control (usage `0xE0`) through bit 7, right meta (usage `0xE7`).
    #[must_use]
    pub fn modifier_bit(self) -> Option<u8> {
        match self {
            Key::LControl => Some(0),
            Key::LShift => Some(1),
            Key::LMenu => Some(2),
            Key::LSuper => Some(3),
            Key::RControl => Some(4),
            Key::RShift => Some(5),
            Key::RMenu => Some(6),
            Key::RSuper => Some(7),
            _ => None,
        }
    }

    /// The keyboard-page (`0x07`) HID usage code for an ordinary key.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn keyboard_usage(self) -> Option<u8> {
        Some(match self {
            Key::A => 0x04,
            Key::B => 0x05,
            Key::C => 0x06,
            Key::D => 0x07,
            Key::E => 0x08,
            Key::F => 0x09,
            Key::G => 0x0A,
            Key::H => 0x0B,
            Key::I => 0x0C,
            Key::J => 0x0D,
            Key::K => 0x0E,
            Key::L => 0x0F,
            Key::M => 0x10,
            Key::N => 0x11,
            Key::O => 0x12,
            Key::P => 0x13,
            Key::Q => 0x14,
            Key::R => 0x15,
            Key::S => 0x16,
            Key::T => 0x17,
            Key::U => 0x18,
            Key::V => 0x19,
            Key::W => 0x1A,
            Key::X => 0x1B,
            Key::Y => 0x1C,
            Key::Z => 0x1D,
            Key::Key1 => 0x1E,
            Key::Key2 => 0x1F,
            Key::Key3 => 0x20,
            Key::Key4 => 0x21,
            Key::Key5 => 0x22,
            Key::Key6 => 0x23,
            Key::Key7 => 0x24,
            Key::Key8 => 0x25,
            Key::Key9 => 0x26,
            Key::Key0 => 0x27,
            Key::Return => 0x28,
            Key::Escape => 0x29,
            Key::Back => 0x2A,
            Key::Tab => 0x2B,
            Key::Space => 0x2C,
            Key::OemMinus => 0x2D,
            Key::OemPlus => 0x2E,
            Key::Oem4SquareBracketOpen => 0x2F,
            Key::Oem6SquareBracketClose => 0x30,
            Key::Oem5Backslash => 0x31,
            Key::Oem1Semicolon => 0x33,
            Key::Oem7SingleQuote => 0x34,
            Key::Oem3Backtick => 0x35,
            Key::OemComma => 0x36,
            Key::OemPeriod => 0x37,
            Key::Oem2ForwardSlash => 0x38,
            Key::Capital => 0x39,
            Key::F1 => 0x3A,
            Key::F2 => 0x3B,
            Key::F3 => 0x3C,
            Key::F4 => 0x3D,
            Key::F5 => 0x3E,
            Key::F6 => 0x3F,
            Key::F7 => 0x40,
            Key::F8 => 0x41,
            Key::F9 => 0x42,
            Key::F10 => 0x43,
            Key::F11 => 0x44,
            Key::F12 => 0x45,
            Key::Print | Key::Snapshot => 0x46,
            Key::Scroll => 0x47,
            Key::Insert => 0x49,
            Key::Home => 0x4A,
            Key::Prior => 0x4B,
            Key::Delete => 0x4C,
            Key::End => 0x4D,
            Key::Next => 0x4E,
            Key::Right => 0x4F,
            Key::Left => 0x50,
            Key::Down => 0x51,
            Key::Up => 0x52,
            Key::NumLock => 0x53,
            Key::Divide => 0x54,
            Key::Multiply => 0x55,
            Key::Subtract => 0x56,
            Key::Add => 0x57,
            Key::Numpad1 => 0x59,
            Key::Numpad2 => 0x5A,
            Key::Numpad3 => 0x5B,
            Key::Numpad4 => 0x5C,
            Key::Numpad5 => 0x5D,
            Key::Numpad6 => 0x5E,
            Key::Numpad7 => 0x5F,
            Key::Numpad8 => 0x60,
            Key::Numpad9 => 0x61,
            Key::Numpad0 => 0x62,
            Key::Decimal => 0x63,
            Key::Apps => 0x65,
            Key::Execute => 0x74,
            Key::Help => 0x75,
            Key::Select => 0x77,
            Key::Separator => 0x85,
            Key::Convert => 0x8A,
            Key::NonConvert => 0x8B,
            Key::Accept => 0x90,
            Key::ModeChange => 0x91,
            Key::Sleep => 0x66,
            _ => return None,
        })
    }

    /// The consumer-page (`0x0C`) usage code for a media key, truncated to
    /// the low byte: the consumer report this server emits is two bytes
    /// wide (`[usage_low, 0]`, see [`crate::keyboard::Keyboard::report`]),
    /// so every media key the server recognizes is one whose consumer
    /// usage fits in a single byte.
    #[must_use]
    pub fn media_usage(self) -> Option<u8> {
        Some(match self {
            Key::MediaPlayPause => 0xCD,
            Key::MediaPrevTrack => 0xB6,
            Key::MediaNextTrack => 0xB5,
            Key::VolumeMute => 0xE2,
            Key::VolumeUp => 0xE9,
            Key::VolumeDown => 0xEA,
            Key::MediaStop => 0xB7,
            // The full USB consumer-page usages for these three exceed a
            // single byte (0x0224/0x0225/0x0227); truncated to the low byte
            // to fit this server's two-byte consumer report.
            Key::BrowserBack => 0x24,
            Key::BrowserForward => 0x25,
            Key::BrowserRefresh => 0x27,
            _ => return None,
        })
    }
}

/// All 122 [`Key`] values, indexed by [`Key::id`], used by [`Key::from_id`].
const ALL: [Key; KEY_COUNT] = [
    Key::Key0,
    Key::Key1,
    Key::Key2,
    Key::Key3,
    Key::Key4,
    Key::Key5,
    Key::Key6,
    Key::Key7,
    Key::Key8,
    Key::Key9,
    Key::A,
    Key::B,
    Key::C,
    Key::D,
    Key::E,
    Key::F,
    Key::G,
    Key::H,
    Key::I,
    Key::J,
    Key::K,
    Key::L,
    Key::M,
    Key::N,
    Key::O,
    Key::P,
    Key::Q,
    Key::R,
    Key::S,
    Key::T,
    Key::U,
    Key::V,
    Key::W,
    Key::X,
    Key::Y,
    Key::Z,
    Key::F1,
    Key::F2,
    Key::F3,
    Key::F4,
    Key::F5,
    Key::F6,
    Key::F7,
    Key::F8,
    Key::F9,
    Key::F10,
    Key::F11,
    Key::F12,
    Key::NumLock,
    Key::Scroll,
    Key::Back,
    Key::Tab,
    Key::Return,
    Key::LShift,
    Key::RShift,
    Key::LControl,
    Key::RControl,
    Key::LMenu,
    Key::RMenu,
    Key::Capital,
    Key::Escape,
    Key::Convert,
    Key::NonConvert,
    Key::Accept,
    Key::ModeChange,
    Key::Space,
    Key::Prior,
    Key::Next,
    Key::End,
    Key::Home,
    Key::Left,
    Key::Up,
    Key::Right,
    Key::Down,
    Key::Select,
    Key::Print,
    Key::Execute,
    Key::Snapshot,
    Key::Insert,
    Key::Delete,
    Key::Help,
    Key::LSuper,
    Key::RSuper,
    Key::Apps,
    Key::Sleep,
    Key::Numpad0,
    Key::Numpad1,
    Key::Numpad2,
    Key::Numpad3,
    Key::Numpad4,
    Key::Numpad5,
    Key::Numpad6,
    Key::Numpad7,
    Key::Numpad8,
    Key::Numpad9,
    Key::Multiply,
    Key::Add,
    Key::Separator,
    Key::Subtract,
    Key::Decimal,
    Key::Divide,
    Key::OemPlus,
    Key::OemComma,
    Key::OemMinus,
    Key::OemPeriod,
    Key::Oem1Semicolon,
    Key::Oem2ForwardSlash,
    Key::Oem3Backtick,
    Key::Oem4SquareBracketOpen,
    Key::Oem5Backslash,
    Key::Oem6SquareBracketClose,
    Key::Oem7SingleQuote,
    Key::MediaPlayPause,
    Key::MediaPrevTrack,
    Key::MediaNextTrack,
    Key::VolumeMute,
    Key::VolumeUp,
    Key::VolumeDown,
    Key::MediaStop,
    Key::BrowserBack,
    Key::BrowserForward,
    Key::BrowserRefresh,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for key in ALL {
            assert_eq!(Key::from_id(key.id()), Some(key));
        }
    }

    #[test]
    fn from_id_out_of_range_is_none() {
        assert_eq!(Key::from_id(122), None);
        assert_eq!(Key::from_id(u16::MAX), None);
    }

    #[test]
    fn partitions_are_mutually_exclusive() {
        for key in ALL {
            let flags = [
                key.is_modifier(),
                key.is_media(),
                key.keyboard_usage().is_some(),
            ];
            assert_eq!(
                flags.iter().filter(|b| **b).count(),
                1,
                "key {key:?} must belong to exactly one partition"
            );
        }
    }

    #[test]
    fn modifier_bits_are_distinct() {
        let mut bits: Vec<u8> = ALL.iter().copied().filter_map(Key::modifier_bit).collect();
        bits.sort_unstable();
        assert_eq!(bits, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn volume_up_matches_scenario() {
        assert_eq!(Key::VolumeUp.media_usage(), Some(0xE9));
    }

    #[test]
    fn key_a_and_c_usages_match_scenarios() {
        assert_eq!(Key::A.keyboard_usage(), Some(0x04));
        assert_eq!(Key::C.keyboard_usage(), Some(0x06));
        assert_eq!(Key::LControl.modifier_bit(), Some(0));
    }
}
