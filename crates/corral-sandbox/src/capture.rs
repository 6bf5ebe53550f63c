//! Output capture replacing the guest-visible standard streams.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{PolicyViolation, RestrictedAction};

#[derive(Debug, Default)]
struct CapturedStream {
    buffer: Mutex<Vec<u8>>,
    active: AtomicBool,
}

impl CapturedStream {
    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        // A writer that panicked mid-append leaves bytes, not broken state.
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn activate(&self) {
        self.buffer().clear();
        self.active.store(true, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer()).into_owned()
    }
}

/// Which of the two captured streams a writer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard output.
    Output,
    /// Standard error.
    Error,
}

/// Owns the output and error buffers that stand in for the console.
///
/// Until [`install`](Self::install) is called the writers handed out by
/// [`stdout`](Self::stdout) and [`stderr`](Self::stderr) forward to the real
/// process streams. Afterwards every write lands in memory and can be read
/// back with [`drain_output`](Self::drain_output) and
/// [`drain_error`](Self::drain_error).
///
/// ```
/// use std::io::Write;
/// use corral_sandbox::OutputCapture;
///
/// let capture = OutputCapture::new();
/// capture.install().expect("capture installs");
/// write!(capture.stdout(), "hello").expect("write succeeds");
/// assert_eq!(capture.drain_output(), "hello");
/// capture.clear();
/// assert_eq!(capture.drain_output(), "");
/// ```
#[derive(Debug, Default)]
pub struct OutputCapture {
    output: CapturedStream,
    error: CapturedStream,
    sealed: AtomicBool,
}

impl OutputCapture {
    /// Creates an inactive capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts capturing both streams with empty buffers.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyViolation`] once a termination guard has sealed the
    /// capture; the streams may only be installed once before that point.
    pub fn install(&self) -> Result<(), PolicyViolation> {
        if self.sealed.load(Ordering::SeqCst) {
            return Err(PolicyViolation::new(RestrictedAction::ReplaceOutputStreams));
        }
        self.output.activate();
        self.error.activate();
        Ok(())
    }

    /// Returns `true` once [`install`](Self::install) has succeeded.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.output.is_active() && self.error.is_active()
    }

    /// Returns everything written to standard output since the last clear.
    #[must_use]
    pub fn drain_output(&self) -> String {
        self.output.contents()
    }

    /// Returns everything written to standard error since the last clear.
    #[must_use]
    pub fn drain_error(&self) -> String {
        self.error.contents()
    }

    /// Empties both buffers.
    pub fn clear(&self) {
        self.output.buffer().clear();
        self.error.buffer().clear();
    }

    /// Returns a writer for standard output.
    #[must_use]
    pub const fn stdout(&self) -> StreamWriter<'_> {
        StreamWriter {
            stream: &self.output,
            kind: StreamKind::Output,
        }
    }

    /// Returns a writer for standard error.
    #[must_use]
    pub const fn stderr(&self) -> StreamWriter<'_> {
        StreamWriter {
            stream: &self.error,
            kind: StreamKind::Error,
        }
    }

    /// Seals the capture and reports whether it was already sealed.
    pub(crate) fn seal(&self) -> bool {
        self.sealed.swap(true, Ordering::SeqCst)
    }
}

/// [`Write`] handle onto one of the captured streams.
#[derive(Debug, Clone, Copy)]
pub struct StreamWriter<'a> {
    stream: &'a CapturedStream,
    kind: StreamKind,
}

impl StreamWriter<'_> {
    /// Returns the stream this writer targets.
    #[must_use]
    pub const fn kind(&self) -> StreamKind {
        self.kind
    }
}

impl Write for StreamWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.stream.is_active() {
            self.stream.buffer().extend_from_slice(buf);
            return Ok(buf.len());
        }
        match self.kind {
            StreamKind::Output => io::stdout().write(buf),
            StreamKind::Error => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.stream.is_active() {
            return Ok(());
        }
        match self.kind {
            StreamKind::Output => io::stdout().flush(),
            StreamKind::Error => io::stderr().flush(),
        }
    }
}
