//! Termination interception and stream protection policy.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::capture::OutputCapture;
use crate::error::{PolicyViolation, RestrictedAction, SandboxError};
use crate::signal::{Interrupt, StatusSignal};

/// Which termination requests are converted into status codes.
///
/// Requests returned through [`Interrupt::Exit`] are always honoured. The
/// policy only governs requests raised with [`request_termination`], which
/// unwind from an arbitrary depth and may originate in framework code rather
/// than in the tool itself.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TerminationTrust {
    /// Every termination request yields a status code.
    #[default]
    AnyRequest,
    /// Only requests returned directly by the entry point yield a status code.
    DirectOnly,
}

impl TerminationTrust {
    /// Returns `true` when unwound termination requests are honoured.
    #[must_use]
    pub const fn honours_unwound(self) -> bool {
        matches!(self, Self::AnyRequest)
    }
}

/// Stops guest code from ending the host and from undoing the capture.
#[derive(Debug, Default)]
pub struct TerminationGuard {
    installed: AtomicBool,
    trust: TerminationTrust,
}

impl TerminationGuard {
    /// Creates an uninstalled guard.
    #[must_use]
    pub const fn new(trust: TerminationTrust) -> Self {
        Self {
            installed: AtomicBool::new(false),
            trust,
        }
    }

    /// Installs the guard and seals the capture against reinstallation.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::CaptureNotInstalled`] if `capture` is not yet
    /// active, or a [`PolicyViolation`] if this guard is already installed or
    /// another guard already sealed `capture`.
    pub fn install(&self, capture: &OutputCapture) -> Result<(), SandboxError> {
        if !capture.is_installed() {
            return Err(SandboxError::CaptureNotInstalled);
        }
        if self.is_installed() || capture.seal() {
            return Err(PolicyViolation::new(RestrictedAction::ReplaceTerminationPolicy).into());
        }
        self.installed.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Returns `true` once the guard is in force.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Returns the configured trust policy.
    #[must_use]
    pub const fn trust(&self) -> TerminationTrust {
        self.trust
    }

    /// Converts a termination request into an [`Interrupt`].
    ///
    /// There is no code path that ends the process.
    #[must_use]
    pub const fn intercept_termination(&self, code: i32) -> Interrupt {
        Interrupt::Exit(StatusSignal::new(code))
    }

    /// Refuses `action` while the guard is installed.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyViolation`] for every restricted action once the
    /// guard is installed.
    pub fn check_policy_violation(&self, action: RestrictedAction) -> Result<(), PolicyViolation> {
        if self.is_installed() {
            return Err(PolicyViolation::new(action));
        }
        Ok(())
    }
}

/// Unwinds to the invocation wrapper carrying a [`StatusSignal`].
///
/// For guest code that cannot thread an [`Interrupt`] back to its entry
/// point. The panic hook is not invoked. Requires `panic = "unwind"`.
pub fn request_termination(code: i32) -> ! {
    panic::resume_unwind(Box::new(StatusSignal::new(code)))
}
