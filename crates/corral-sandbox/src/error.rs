//! Domain errors raised by the sandbox.

use std::fmt;

use thiserror::Error;

/// Actions the guard forbids once it is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictedAction {
    /// Swapping out the termination policy, including reinstalling the guard.
    ReplaceTerminationPolicy,
    /// Redirecting the captured output or error streams elsewhere.
    ReplaceOutputStreams,
}

impl RestrictedAction {
    /// Returns a short description of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReplaceTerminationPolicy => "replacing the termination policy",
            Self::ReplaceOutputStreams => "replacing the output streams",
        }
    }
}

impl fmt::Display for RestrictedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attempt to subvert the sandbox.
///
/// Deliberately a different type from [`StatusSignal`](crate::StatusSignal):
/// callers must never confuse a breach with a tool's exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{action} isn't allowed while the termination guard is installed")]
pub struct PolicyViolation {
    action: RestrictedAction,
}

impl PolicyViolation {
    pub(crate) const fn new(action: RestrictedAction) -> Self {
        Self { action }
    }

    /// Returns the action that was refused.
    #[must_use]
    pub const fn action(self) -> RestrictedAction {
        self.action
    }
}

/// Errors raised while installing the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// The guard was installed before output capture.
    #[error("output capture must be installed before the termination guard")]
    CaptureNotInstalled,

    /// The installation itself was a restricted action.
    #[error(transparent)]
    Violation(#[from] PolicyViolation),
}
