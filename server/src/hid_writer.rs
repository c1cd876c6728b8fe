//! The HID report writer: a single process-wide lock guarding append writes
//! to the keyboard/mouse/consumer character-device endpoints.
//!
//! Grounded on the teacher's `ble::Server::send_report` (one writer,
//! `Arc<Mutex<_>>`-guarded, used by every report kind) and on
//! `examples/other_examples/2582d62f_mofeng-git-One-KVM__src-hid-otg.rs.rs`
//! (the `OtgBackend` pattern of opening a gadget device path in append mode
//! with `O_NONBLOCK` and treating `ErrorKind::WouldBlock` as a drop rather
//! than a failure).

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;

/// Which HID device endpoint a report is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// The 8-byte boot-protocol keyboard report endpoint.
    Keyboard,
    /// The 5-byte mouse report endpoint.
    Mouse,
    /// The 2-byte consumer (media) report endpoint.
    Consumer,
}

/// Abstraction over "a place HID reports get written", so the engines can
/// be exercised in tests without a real gadget device present.
pub trait HidSink: Send + Sync {
    /// Writes one report for `kind`. Implementations should return an
    /// `io::Error` with `ErrorKind::WouldBlock` when the device isn't ready
    /// to accept a write; any other `Err` is treated as a real failure.
    fn write(&self, kind: ReportKind, report: &[u8]) -> io::Result<()>;
}

/// A [`HidSink`] backed by three real character-device paths, opened in
/// append mode with non-blocking writes.
pub struct FileSink {
    keyboard_path: PathBuf,
    mouse_path: PathBuf,
    media_path: PathBuf,
}

impl FileSink {
    /// Builds a sink that writes to the given device paths.
    #[must_use]
    pub fn new(keyboard_path: PathBuf, mouse_path: PathBuf, media_path: PathBuf) -> Self {
        Self {
            keyboard_path,
            mouse_path,
            media_path,
        }
    }

    fn path_for(&self, kind: ReportKind) -> &PathBuf {
        match kind {
            ReportKind::Keyboard => &self.keyboard_path,
            ReportKind::Mouse => &self.mouse_path,
            ReportKind::Consumer => &self.media_path,
        }
    }
}

impl HidSink for FileSink {
    fn write(&self, kind: ReportKind, report: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .append(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(self.path_for(kind))?;
        file.write_all(report)
    }
}

/// The HID writer: one process-wide lock held across every device path, so
/// two concurrent callers never interleave partial reports, per `spec.md`
/// §4.1 and §9.
pub struct HidWriter {
    lock: Mutex<()>,
    sink: Arc<dyn HidSink>,
}

impl HidWriter {
    /// Builds a writer backed by real device files at the given paths.
    #[must_use]
    pub fn new(keyboard_path: PathBuf, mouse_path: PathBuf, media_path: PathBuf) -> Self {
        Self::with_sink(Arc::new(FileSink::new(keyboard_path, mouse_path, media_path)))
    }

    /// Builds a writer backed by an arbitrary [`HidSink`] (used in tests).
    #[must_use]
    pub fn with_sink(sink: Arc<dyn HidSink>) -> Self {
        Self {
            lock: Mutex::new(()),
            sink,
        }
    }

    /// Writes one report, serialized against every other writer caller
    /// regardless of report kind.
    ///
    /// A `WouldBlock` write is logged and dropped rather than surfaced as
    /// an error, per `spec.md` §4.1 and §7 (`DeviceUnavailable` is
    /// observability-only). Any other I/O error becomes
    /// [`Error::DeviceWriteError`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceWriteError`] for any write failure other than
    /// would-block.
    pub fn write(&self, kind: ReportKind, report: &[u8]) -> Result<(), Error> {
        let _guard = self.lock.lock();
        match self.sink.write(kind, report) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                log::warn!("HID device for {kind:?} would block, dropping report");
                Ok(())
            }
            Err(err) => Err(Error::DeviceWriteError {
                path: format!("{kind:?}"),
                source: err,
            }),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::HashMap;

    use super::{HidSink, ReportKind};

    /// A [`HidSink`] that records every write in memory, for engine tests.
    #[derive(Default)]
    pub struct RecordingSink {
        writes: parking_lot::Mutex<HashMap<&'static str, Vec<Vec<u8>>>>,
    }

    fn key(kind: ReportKind) -> &'static str {
        match kind {
            ReportKind::Keyboard => "keyboard",
            ReportKind::Mouse => "mouse",
            ReportKind::Consumer => "consumer",
        }
    }

    impl RecordingSink {
        /// All reports written for `kind`, in order.
        #[must_use]
        pub fn writes(&self, kind: ReportKind) -> Vec<Vec<u8>> {
            self.writes
                .lock()
                .get(key(kind))
                .cloned()
                .unwrap_or_default()
        }

        /// The most recently written report for `kind`, if any.
        #[must_use]
        pub fn last(&self, kind: ReportKind) -> Option<Vec<u8>> {
            self.writes(kind).last().cloned()
        }

        /// Number of reports written for `kind`.
        #[must_use]
        pub fn count(&self, kind: ReportKind) -> usize {
            self.writes(kind).len()
        }
    }

    impl HidSink for RecordingSink {
        fn write(&self, kind: ReportKind, report: &[u8]) -> std::io::Result<()> {
            self.writes
                .lock()
                .entry(key(kind))
                .or_default()
                .push(report.to_vec());
            Ok(())
        }
    }

    #[test]
    fn would_block_is_dropped_not_propagated() {
        struct Blocking;
        impl HidSink for Blocking {
            fn write(&self, _kind: ReportKind, _report: &[u8]) -> std::io::Result<()> {
                Err(std::io::Error::from(std::io::ErrorKind::WouldBlock))
            }
        }
        let writer = super::HidWriter::with_sink(std::sync::Arc::new(Blocking));
        assert!(writer.write(ReportKind::Mouse, &[0; 5]).is_ok());
    }

    #[test]
    fn other_errors_propagate() {
        struct Failing;
        impl HidSink for Failing {
            fn write(&self, _kind: ReportKind, _report: &[u8]) -> std::io::Result<()> {
                Err(std::io::Error::other("device gone"))
            }
        }
        let writer = super::HidWriter::with_sink(std::sync::Arc::new(Failing));
        assert!(writer.write(ReportKind::Mouse, &[0; 5]).is_err());
    }
}
