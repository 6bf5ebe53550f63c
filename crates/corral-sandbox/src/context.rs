//! The process view handed to guest entry points.

use crate::capture::StreamWriter;
use crate::error::{PolicyViolation, RestrictedAction};
use crate::guard::request_termination;
use crate::sandbox::Sandbox;
use crate::signal::Interrupt;

/// Standard streams and termination for one guest invocation.
///
/// ```
/// use std::io::Write;
/// use corral_sandbox::{GuestContext, GuestResult, Sandbox, TerminationTrust};
///
/// fn main_entry(ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
///     write!(ctx.stdout(), "hello")?;
///     Err(ctx.exit(2))
/// }
///
/// let sandbox = Sandbox::install(TerminationTrust::default()).expect("sandbox installs");
/// let ctx = GuestContext::new(&sandbox);
/// let outcome = main_entry(&ctx, &[]);
/// assert_eq!(outcome.expect_err("guest exits").status(), Some(2));
/// assert_eq!(sandbox.capture().drain_output(), "hello");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GuestContext<'a> {
    sandbox: &'a Sandbox,
}

impl<'a> GuestContext<'a> {
    /// Creates a context bound to `sandbox`.
    #[must_use]
    pub const fn new(sandbox: &'a Sandbox) -> Self {
        Self { sandbox }
    }

    /// Returns the guest's standard output.
    #[must_use]
    pub const fn stdout(&self) -> StreamWriter<'a> {
        self.sandbox.capture().stdout()
    }

    /// Returns the guest's standard error.
    #[must_use]
    pub const fn stderr(&self) -> StreamWriter<'a> {
        self.sandbox.capture().stderr()
    }

    /// Requests termination; return the result as the entry point's error.
    #[must_use]
    pub const fn exit(&self, code: i32) -> Interrupt {
        self.sandbox.guard().intercept_termination(code)
    }

    /// Requests termination from any call depth by unwinding.
    pub fn exit_now(&self, code: i32) -> ! {
        request_termination(code)
    }

    /// Attempts to point the standard streams somewhere else.
    ///
    /// # Errors
    ///
    /// Always fails with a [`PolicyViolation`] inside an installed sandbox.
    pub fn redirect_output(&self) -> Result<(), PolicyViolation> {
        self.sandbox
            .guard()
            .check_policy_violation(RestrictedAction::ReplaceOutputStreams)?;
        self.sandbox.capture().install()
    }

    /// Attempts to swap out the termination policy.
    ///
    /// # Errors
    ///
    /// Always fails with a [`PolicyViolation`] inside an installed sandbox.
    pub fn replace_termination_policy(&self) -> Result<(), PolicyViolation> {
        self.sandbox
            .guard()
            .check_policy_violation(RestrictedAction::ReplaceTerminationPolicy)
    }
}
