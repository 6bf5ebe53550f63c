//! Installs capture and guard in the required order.

use crate::capture::OutputCapture;
use crate::error::SandboxError;
use crate::guard::{TerminationGuard, TerminationTrust};

/// An installed output capture paired with its termination guard.
///
/// Construction performs both installations, capture first, so every
/// `Sandbox` value is already in force.
#[derive(Debug)]
pub struct Sandbox {
    capture: OutputCapture,
    guard: TerminationGuard,
}

impl Sandbox {
    /// Installs a fresh capture and guard.
    ///
    /// # Errors
    ///
    /// Propagates any [`SandboxError`] raised during installation.
    pub fn install(trust: TerminationTrust) -> Result<Self, SandboxError> {
        let capture = OutputCapture::new();
        capture.install()?;
        let guard = TerminationGuard::new(trust);
        guard.install(&capture)?;
        Ok(Self { capture, guard })
    }

    /// Returns the output capture.
    #[must_use]
    pub const fn capture(&self) -> &OutputCapture {
        &self.capture
    }

    /// Returns the termination guard.
    #[must_use]
    pub const fn guard(&self) -> &TerminationGuard {
        &self.guard
    }
}
