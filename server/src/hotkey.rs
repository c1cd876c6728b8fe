//! Hotkey string parser: a pure function from a brace-grammar string to a
//! list of [`HotkeyStep`]s, with no I/O.
//!
//! Grounded on `examples/original_source/app/hotkey_parser.py`
//! (`parse_hotkey`) and the name table in
//! `examples/original_source/app/key_str_utils.py` (`STR_TO_KEY`).
//!
//! Grammar (informal EBNF):
//!
//! ```text
//! hotkey   := token*
//! token    := literal | brace
//! brace    := '{' name (' ' action)? (':' digit+)? '}'
//! literal  := any char other than '{'
//! ```
//!
//! A literal character compiles to a `DOWN` step followed by an `UP` step.
//! A brace token with no action defaults to `PRESS`, which compiles to the
//! same `DOWN`-then-`UP` pair: the `DOWN` step runs immediately and the
//! `UP` step carries the `:digit+` suffix as its `wait_ms` (the delay the
//! dispatcher sleeps before executing the step, see `spec.md` §4.5). An
//! explicit `Up`/`Down` action brace compiles to a single step instead,
//! with the suffix as that step's `wait_ms`. An unclosed `{` is treated as
//! a literal `{` character, matching the original parser.

use crate::action::ActionType;
use crate::error::Error;
use crate::key::Key;

/// One step of a parsed hotkey sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyStep {
    /// The key this step acts on.
    pub key: Key,
    /// The action to apply.
    pub action: ActionType,
    /// Delay, in milliseconds, the dispatcher sleeps before this step.
    pub wait_ms: Option<u32>,
    /// Override for the down-to-up interval of a `PRESS` step.
    pub speed_ms: Option<u32>,
}

/// Parses a hotkey string into its steps.
///
/// # Errors
///
/// Returns [`Error::UnknownKey`] if a literal character or brace name does
/// not resolve to a known [`Key`], or [`Error::MalformedHotkey`] if a
/// brace token's `:wait` suffix isn't a valid non-negative integer.
pub fn parse_hotkey(input: &str) -> Result<Vec<HotkeyStep>, Error> {
    let mut steps = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '{' {
            if let Some(end) = chars[i + 1..].iter().position(|&c| c == '}').map(|p| p + i + 1) {
                let command: String = chars[i + 1..end].iter().collect();
                parse_brace(&command, &mut steps)?;
                i = end + 1;
                continue;
            }
            push_literal(&mut steps, '{')?;
            i += 1;
            continue;
        }
        push_literal(&mut steps, chars[i])?;
        i += 1;
    }

    Ok(steps)
}

fn push_literal(steps: &mut Vec<HotkeyStep>, ch: char) -> Result<(), Error> {
    let key = str_to_key(&ch.to_string())?;
    steps.push(HotkeyStep {
        key,
        action: ActionType::Down,
        wait_ms: None,
        speed_ms: None,
    });
    steps.push(HotkeyStep {
        key,
        action: ActionType::Up,
        wait_ms: None,
        speed_ms: None,
    });
    Ok(())
}

fn parse_brace(command: &str, steps: &mut Vec<HotkeyStep>) -> Result<(), Error> {
    let mut parts = command.split(':');
    let head = parts.next().unwrap_or_default();
    let wait_ms = match parts.next() {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| Error::MalformedHotkey(format!("invalid wait value: {raw}")))?,
        ),
        None => None,
    };
    if parts.next().is_some() {
        return Err(Error::MalformedHotkey(format!(
            "too many ':' separators in: {command}"
        )));
    }

    let mut subparts = head.splitn(2, ' ');
    let name = subparts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::MalformedHotkey("empty key name".to_string()))?;
    let action = match subparts.next() {
        Some(action_name) => action_from_name(action_name),
        None => ActionType::Press,
    };

    let key = str_to_key(name)?;

    if action == ActionType::Press {
        steps.push(HotkeyStep {
            key,
            action: ActionType::Down,
            wait_ms: None,
            speed_ms: None,
        });
        steps.push(HotkeyStep {
            key,
            action: ActionType::Up,
            wait_ms,
            speed_ms: None,
        });
        return Ok(());
    }

    steps.push(HotkeyStep {
        key,
        action,
        wait_ms,
        speed_ms: None,
    });
    Ok(())
}

fn action_from_name(name: &str) -> ActionType {
    match name.to_ascii_uppercase().as_str() {
        "UP" => ActionType::Up,
        "DOWN" => ActionType::Down,
        _ => ActionType::Press,
    }
}

/// Resolves a hotkey-grammar key name (a single literal character or a
/// brace name like `Ctrl`) to a [`Key`].
///
/// # Errors
///
/// Returns [`Error::UnknownKey`] if the name isn't recognized.
pub fn str_to_key(name: &str) -> Result<Key, Error> {
    let lower_single = name.len() == 1 && name.chars().next().is_some_and(char::is_alphabetic);
    let key = if lower_single {
        letter_key(name.to_ascii_lowercase().chars().next().unwrap())
    } else {
        named_key(name)
    };
    key.ok_or_else(|| Error::UnknownKey(name.to_string()))
}

fn letter_key(c: char) -> Option<Key> {
    Some(match c {
        'a' => Key::A,
        'b' => Key::B,
        'c' => Key::C,
        'd' => Key::D,
        'e' => Key::E,
        'f' => Key::F,
        'g' => Key::G,
        'h' => Key::H,
        'i' => Key::I,
        'j' => Key::J,
        'k' => Key::K,
        'l' => Key::L,
        'm' => Key::M,
        'n' => Key::N,
        'o' => Key::O,
        'p' => Key::P,
        'q' => Key::Q,
        'r' => Key::R,
        's' => Key::S,
        't' => Key::T,
        'u' => Key::U,
        'v' => Key::V,
        'w' => Key::W,
        'x' => Key::X,
        'y' => Key::Y,
        'z' => Key::Z,
        _ => return None,
    })
}

#[allow(clippy::too_many_lines)]
fn named_key(name: &str) -> Option<Key> {
    if name.len() == 1 {
        if let Some(digit) = name.chars().next().filter(char::is_ascii_digit) {
            return digit_key(digit);
        }
    }
    Some(match name {
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        "NumLock" => Key::NumLock,
        "ScrollLock" => Key::Scroll,
        "Backspace" => Key::Back,
        "Tab" => Key::Tab,
        "Enter" | "Return" => Key::Return,
        "LShift" => Key::LShift,
        "RShift" => Key::RShift,
        "Shift" => Key::LShift,
        "LCtrl" => Key::LControl,
        "RCtrl" => Key::RControl,
        "Ctrl" => Key::LControl,
        "LAlt" => Key::LMenu,
        "RAlt" => Key::RMenu,
        "Alt" => Key::LMenu,
        "CapsLock" => Key::Capital,
        "Escape" | "Esc" => Key::Escape,
        "Space" => Key::Space,
        "PageUp" => Key::Prior,
        "PageDown" => Key::Next,
        "End" => Key::End,
        "Home" => Key::Home,
        "Left" => Key::Left,
        "Up" => Key::Up,
        "Right" => Key::Right,
        "Down" => Key::Down,
        "PrintScreen" => Key::Print,
        "Insert" => Key::Insert,
        "Delete" | "Del" => Key::Delete,
        "LWin" => Key::LSuper,
        "RWin" => Key::RSuper,
        "Win" => Key::LSuper,
        "Numpad0" => Key::Numpad0,
        "Numpad1" => Key::Numpad1,
        "Numpad2" => Key::Numpad2,
        "Numpad3" => Key::Numpad3,
        "Numpad4" => Key::Numpad4,
        "Numpad5" => Key::Numpad5,
        "Numpad6" => Key::Numpad6,
        "Numpad7" => Key::Numpad7,
        "Numpad8" => Key::Numpad8,
        "Numpad9" => Key::Numpad9,
        "NumpadMultiply" => Key::Multiply,
        "NumpadAdd" => Key::Add,
        "NumpadSubtract" => Key::Subtract,
        "NumpadDecimal" => Key::Decimal,
        "NumpadDivide" => Key::Divide,
        "+" => Key::OemPlus,
        "," => Key::OemComma,
        "-" => Key::OemMinus,
        "." => Key::OemPeriod,
        ";" => Key::Oem1Semicolon,
        "/" => Key::Oem2ForwardSlash,
        "`" => Key::Oem3Backtick,
        "[" => Key::Oem4SquareBracketOpen,
        "\\" => Key::Oem5Backslash,
        "]" => Key::Oem6SquareBracketClose,
        "'" => Key::Oem7SingleQuote,
        // An unclosed '{' is treated as a literal character (spec.md §4.4);
        // both braces share the same physical key as their bracket pair.
        "{" => Key::Oem4SquareBracketOpen,
        "}" => Key::Oem6SquareBracketClose,
        "MediaPlayPause" => Key::MediaPlayPause,
        "MediaPrevTrack" => Key::MediaPrevTrack,
        "MediaNextTrack" => Key::MediaNextTrack,
        "VolumeMute" => Key::VolumeMute,
        "VolumeUp" => Key::VolumeUp,
        "VolumeDown" => Key::VolumeDown,
        "MediaStop" => Key::MediaStop,
        "BrowserBack" => Key::BrowserBack,
        "BrowserForward" => Key::BrowserForward,
        "BrowserRefresh" => Key::BrowserRefresh,
        _ => return None,
    })
}

fn digit_key(digit: char) -> Option<Key> {
    Some(match digit {
        '0' => Key::Key0,
        '1' => Key::Key1,
        '2' => Key::Key2,
        '3' => Key::Key3,
        '4' => Key::Key4,
        '5' => Key::Key5,
        '6' => Key::Key6,
        '7' => Key::Key7,
        '8' => Key::Key8,
        '9' => Key::Key9,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_characters_become_down_up_pairs() {
        let steps = parse_hotkey("ab").unwrap();
        assert_eq!(
            steps,
            vec![
                HotkeyStep { key: Key::A, action: ActionType::Down, wait_ms: None, speed_ms: None },
                HotkeyStep { key: Key::A, action: ActionType::Up, wait_ms: None, speed_ms: None },
                HotkeyStep { key: Key::B, action: ActionType::Down, wait_ms: None, speed_ms: None },
                HotkeyStep { key: Key::B, action: ActionType::Up, wait_ms: None, speed_ms: None },
            ]
        );
    }

    #[test]
    fn brace_with_no_action_defaults_to_press() {
        let steps = parse_hotkey("{Ctrl}").unwrap();
        assert_eq!(
            steps,
            vec![
                HotkeyStep { key: Key::LControl, action: ActionType::Down, wait_ms: None, speed_ms: None },
                HotkeyStep { key: Key::LControl, action: ActionType::Up, wait_ms: None, speed_ms: None },
            ]
        );
    }

    #[test]
    fn brace_press_with_wait_splits_into_down_then_up_with_wait_on_up() {
        let steps = parse_hotkey("{Ctrl Press:300}").unwrap();
        assert_eq!(
            steps,
            vec![
                HotkeyStep { key: Key::LControl, action: ActionType::Down, wait_ms: None, speed_ms: None },
                HotkeyStep { key: Key::LControl, action: ActionType::Up, wait_ms: Some(300), speed_ms: None },
            ]
        );
    }

    #[test]
    fn brace_with_explicit_action_and_wait() {
        let steps = parse_hotkey("{Ctrl Up:500}").unwrap();
        assert_eq!(
            steps,
            vec![HotkeyStep { key: Key::LControl, action: ActionType::Up, wait_ms: Some(500), speed_ms: None }]
        );
    }

    #[test]
    fn unclosed_brace_is_treated_as_literal() {
        let steps = parse_hotkey("{").unwrap();
        assert_eq!(
            steps,
            vec![
                HotkeyStep { key: Key::Oem4SquareBracketOpen, action: ActionType::Down, wait_ms: None, speed_ms: None },
                HotkeyStep { key: Key::Oem4SquareBracketOpen, action: ActionType::Up, wait_ms: None, speed_ms: None },
            ]
        );
    }

    #[test]
    fn unknown_name_errors() {
        let err = parse_hotkey("{Frobnicate}").unwrap_err();
        assert!(matches!(err, Error::UnknownKey(_)));
    }

    #[test]
    fn malformed_wait_errors() {
        let err = parse_hotkey("{Ctrl Up:notanumber}").unwrap_err();
        assert!(matches!(err, Error::MalformedHotkey(_)));
    }
}
