//! Crate-wide error taxonomy.
//!
//! Validator and parser errors are surfaced to the RPC caller with a
//! descriptive message (see the `From<Error> for tonic::Status` impl below).
//! Device-unavailable and movement-timeout conditions are observability-only
//! and never reach this type; callers that hit them log and move on.

use thiserror::Error;

/// Errors produced by the keyboard/mouse engines, the hotkey parser, the
/// input dispatcher, and the configuration store.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration setter was called before the store finished loading.
    #[error("configuration store is not initialized")]
    NotInitialized,

    /// A configuration setter argument fell outside its validator range.
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),

    /// A seventh simultaneous non-modifier key press was attempted.
    #[error("rollover exceeded: six keys are already held")]
    RolloverExceeded,

    /// A modifier operation was called with a bit that isn't a modifier.
    #[error("bit {0:#x} is not a recognized modifier")]
    InvalidModifier(u8),

    /// The hotkey parser could not resolve a key name.
    #[error("unknown key name: {0}")]
    UnknownKey(String),

    /// The hotkey string could not be compiled into steps.
    #[error("malformed hotkey: {0}")]
    MalformedHotkey(String),

    /// A HID device write failed for a reason other than would-block.
    #[error("failed to write to HID device {path}: {source}")]
    DeviceWriteError {
        /// Device path that failed to write.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match err {
            Error::NotInitialized
            | Error::ValueOutOfRange(_)
            | Error::UnknownKey(_)
            | Error::MalformedHotkey(_) => tonic::Status::invalid_argument(err.to_string()),
            Error::RolloverExceeded | Error::InvalidModifier(_) | Error::DeviceWriteError { .. } => {
                tonic::Status::internal(err.to_string())
            }
        }
    }
}
