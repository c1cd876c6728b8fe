//! Shared action-type and per-press option types used across the keyboard,
//! mouse, and hotkey modules.
//!
//! Grounded on `examples/original_source/app/key.py`
//! (`KeyActionType`/`ButtonActionType`/`KeyOptions`).

/// The three actions a key (or modifier, or media key) can be driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// Release the key.
    Up,
    /// Hold the key down.
    Down,
    /// Press and release, holding for the dispatcher's configured interval.
    Press,
}

/// The four actions a mouse button can be driven through; mouse buttons
/// additionally admit [`ButtonActionType::Move`], which carries no button
/// identity and is only meaningful at the dispatcher level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonActionType {
    /// Release the button.
    Up,
    /// Hold the button down.
    Down,
    /// Press and release, holding for a fixed interval.
    Press,
    /// Move the cursor; carries no button identity.
    Move,
}

/// Advisory flags a client can attach to a key press.
///
/// The server carries these through unacted-upon except where the
/// dispatcher is explicitly told to override them (hotkey playback forces
/// `no_repeat = true`, see [`crate::dispatcher`]); no engine reads them to
/// change its own behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyOptions {
    /// Client asks the server not to apply OS-level key repeat.
    pub no_repeat: bool,
    /// Client asks the server to disable any automatically-applied
    /// modifier keys.
    pub disable_unwanted_modifiers: bool,
}
