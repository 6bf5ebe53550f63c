//! In-process sandbox primitives for running command-line tools as guests.
//!
//! A guest is a tool's entry point called inside the host process. The
//! sandbox constrains exactly two behaviours:
//! - Termination: a guest's request to end the process becomes an
//!   [`Interrupt::Exit`] carrying a [`StatusSignal`] instead of an exit.
//! - Standard streams: writes land in an [`OutputCapture`] and cannot be
//!   redirected elsewhere once the [`TerminationGuard`] is installed.
//!
//! There is no filesystem, network, or memory isolation.
//!
//! ```rust
//! use std::io::Write;
//! use corral_sandbox::{GuestContext, Sandbox, TerminationTrust};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sandbox = Sandbox::install(TerminationTrust::AnyRequest)?;
//! let ctx = GuestContext::new(&sandbox);
//!
//! writeln!(ctx.stderr(), "warning: nothing to do")?;
//! assert!(ctx.redirect_output().is_err());
//! assert_eq!(sandbox.capture().drain_error(), "warning: nothing to do\n");
//! # Ok(()) }
//! ```
//!
//! The capture and guard are ordinary values rather than process-wide
//! state. A host that shares one [`Sandbox`] between several invocations must
//! serialise them itself.

mod capture;
mod context;
mod error;
mod guard;
mod sandbox;
mod signal;

#[cfg(test)]
mod tests;

pub use capture::{OutputCapture, StreamKind, StreamWriter};
pub use context::GuestContext;
pub use error::{PolicyViolation, RestrictedAction, SandboxError};
pub use guard::{TerminationGuard, TerminationTrust, request_termination};
pub use sandbox::Sandbox;
pub use signal::{GuestResult, Interrupt, StatusSignal};
