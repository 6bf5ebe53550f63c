//! Control-flow values passed from guest code back to the invocation wrapper.

use std::error::Error;
use std::fmt;
use std::io;

use crate::error::PolicyViolation;

/// A termination request intercepted by the guard.
///
/// Only the [`TerminationGuard`](crate::TerminationGuard) constructs these.
/// The invocation wrapper consumes the signal and keeps only its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusSignal {
    code: i32,
}

impl StatusSignal {
    pub(crate) const fn new(code: i32) -> Self {
        Self { code }
    }

    /// Returns the requested status code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.code
    }
}

impl fmt::Display for StatusSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "termination requested with status {}", self.code)
    }
}

impl Error for StatusSignal {}

/// Why a guest entry point stopped before returning normally.
///
/// Guest code propagates this with `?` instead of unwinding, so the wrapper
/// can tell a finished tool apart from a sandbox breach or a fault.
#[derive(Debug, thiserror::Error)]
pub enum Interrupt {
    /// The guest asked to terminate with a status code.
    #[error(transparent)]
    Exit(#[from] StatusSignal),

    /// The guest attempted a restricted action.
    #[error(transparent)]
    Violation(#[from] PolicyViolation),

    /// Any other guest-level failure.
    #[error("{0}")]
    Fault(#[source] Box<dyn Error + Send + Sync>),
}

impl Interrupt {
    /// Wraps an arbitrary guest failure.
    ///
    /// ```
    /// use corral_sandbox::Interrupt;
    ///
    /// let interrupt = Interrupt::fault("boom");
    /// assert_eq!(interrupt.to_string(), "boom");
    /// ```
    pub fn fault(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Fault(cause.into())
    }

    /// Returns the status code when the guest requested termination.
    #[must_use]
    pub const fn status(&self) -> Option<i32> {
        match self {
            Self::Exit(signal) => Some(signal.code()),
            Self::Violation(_) | Self::Fault(_) => None,
        }
    }
}

impl From<io::Error> for Interrupt {
    fn from(error: io::Error) -> Self {
        Self::Fault(Box::new(error))
    }
}

/// Outcome of a guest entry point.
pub type GuestResult = Result<(), Interrupt>;
