//! The invocation wrapper: run a tool once and reduce the outcome.
//!
//! A [`Tool`] owns one [`LoadedEntryPoint`] and a handle on the shared
//! [`Sandbox`]. [`Tool::run`] calls the entry point and reduces the outcome:
//!
//! | Guest outcome | Result |
//! |---|---|
//! | returns `Ok(())` | `Ok(0)` |
//! | returns [`Interrupt::Exit`] | `Ok(code)` |
//! | unwinds with a [`StatusSignal`] | `Ok(code)`, or an error under [`TerminationTrust::DirectOnly`](corral_sandbox::TerminationTrust::DirectOnly) |
//! | returns [`Interrupt::Violation`] | [`InvocationError::PolicyViolation`] |
//! | returns [`Interrupt::Fault`] | [`InvocationError::Fault`] |
//! | panics | [`InvocationError::Panicked`] |
//!
//! While a guest runs, the panic hook writes panic messages to the captured
//! standard error of the tool's sandbox instead of the host's console. The
//! hook is installed on first use and defers to the previous hook for panics
//! raised outside a guest.
//!
//! The wrapper neither clears nor drains the capture; see
//! [`ToolHost::run`](crate::ToolHost::run) for the full sequence.

use std::any::Any;
use std::cell::RefCell;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use corral_sandbox::{GuestContext, GuestResult, Interrupt, Sandbox, StatusSignal};
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{InvocationError, LoadError};
use crate::manifest::ToolManifest;
use crate::resolver::{EntryResolver, LoadedEntryPoint};

/// Tracing target for tool invocation.
const TOOL_TARGET: &str = "corral_tools::tool";

static PANIC_ROUTING: OnceCell<()> = OnceCell::new();

thread_local! {
    /// Sandbox of the guest running on this thread, if any.
    static RUNNING_GUEST: RefCell<Option<Arc<Sandbox>>> = const { RefCell::new(None) };
}

/// A loaded tool ready to be run inside a sandbox.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use std::sync::Arc;
///
/// use corral_sandbox::{GuestContext, GuestResult, Sandbox, TerminationTrust};
/// use corral_tools::{EntryTable, Tool, ToolManifest};
///
/// fn hello(ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
///     write!(ctx.stdout(), "hello")?;
///     Err(ctx.exit(2))
/// }
///
/// let mut table = EntryTable::new();
/// table.register("Hello", hello).expect("registration succeeds");
///
/// let sandbox = Arc::new(Sandbox::install(TerminationTrust::AnyRequest).expect("installs"));
/// let manifest = ToolManifest::parse("Main-Class: Hello\n").expect("parses");
/// let tool = Tool::from_manifest("hello", &manifest, &table, Arc::clone(&sandbox))
///     .expect("tool loads");
///
/// assert_eq!(tool.run(&[]).expect("tool runs"), 2);
/// assert_eq!(sandbox.capture().drain_output(), "hello");
/// ```
#[derive(Debug)]
pub struct Tool {
    name: String,
    entry: LoadedEntryPoint,
    sandbox: Arc<Sandbox>,
}

impl Tool {
    /// Loads the tool whose bundle or manifest lives at `location`.
    ///
    /// The tool is named after the location's file stem.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the manifest is missing or malformed, or the
    /// entry point cannot be resolved.
    pub fn load<R: EntryResolver + ?Sized>(
        location: &Path,
        resolver: &R,
        sandbox: Arc<Sandbox>,
    ) -> Result<Self, LoadError> {
        let manifest = ToolManifest::read(location)?;
        let name = location
            .file_stem()
            .map_or_else(|| manifest.main_class().to_owned(), |stem| {
                stem.to_string_lossy().into_owned()
            });
        Self::from_manifest(name, &manifest, resolver, sandbox)
    }

    /// Builds a tool from an already parsed manifest.
    ///
    /// # Errors
    ///
    /// Returns the resolver's [`LoadError`] if the entry point cannot be
    /// resolved.
    pub fn from_manifest<R: EntryResolver + ?Sized>(
        name: impl Into<String>,
        manifest: &ToolManifest,
        resolver: &R,
        sandbox: Arc<Sandbox>,
    ) -> Result<Self, LoadError> {
        let tool_name = name.into();
        let entry = resolver.resolve(manifest)?;
        debug!(
            target: TOOL_TARGET,
            tool = %tool_name,
            symbol = entry.symbol(),
            origin = %entry.origin(),
            "loaded tool"
        );
        Ok(Self {
            name: tool_name,
            entry,
            sandbox,
        })
    }

    /// Returns the tool name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the resolved entry point.
    #[must_use]
    pub const fn entry(&self) -> &LoadedEntryPoint {
        &self.entry
    }

    /// Returns the sandbox the tool runs in.
    #[must_use]
    pub const fn sandbox(&self) -> &Arc<Sandbox> {
        &self.sandbox
    }

    /// Runs the entry point once and returns its status code.
    ///
    /// # Errors
    ///
    /// Returns an [`InvocationError`] for sandbox violations, guest faults,
    /// panics, and distrusted termination requests. A termination request is
    /// never an error. The message of a guest panic is also written to the
    /// captured standard error.
    pub fn run(&self, args: &[String]) -> Result<i32, InvocationError> {
        debug!(
            target: TOOL_TARGET,
            tool = %self.name,
            symbol = self.entry.symbol(),
            arg_count = args.len(),
            "invoking entry point"
        );

        route_guest_panics();
        let context = GuestContext::new(&self.sandbox);
        let callable = self.entry.callable();
        let outcome = {
            let _scope = GuestScope::enter(&self.sandbox);
            panic::catch_unwind(AssertUnwindSafe(|| callable(&context, args)))
        };
        let status = match outcome {
            Ok(returned) => self.settle(returned),
            Err(payload) => self.settle_unwound(payload),
        }?;

        debug!(
            target: TOOL_TARGET,
            tool = %self.name,
            status,
            "entry point finished"
        );
        Ok(status)
    }

    fn settle(&self, returned: GuestResult) -> Result<i32, InvocationError> {
        match returned {
            Ok(()) => Ok(0),
            Err(Interrupt::Exit(signal)) => Ok(signal.code()),
            Err(Interrupt::Violation(violation)) => {
                warn!(
                    target: TOOL_TARGET,
                    tool = %self.name,
                    action = %violation.action(),
                    "tool attempted a restricted action"
                );
                Err(InvocationError::PolicyViolation {
                    tool: self.name.clone(),
                    source: violation,
                })
            }
            Err(Interrupt::Fault(cause)) => Err(InvocationError::Fault {
                tool: self.name.clone(),
                source: cause,
            }),
        }
    }

    fn settle_unwound(&self, payload: Box<dyn Any + Send>) -> Result<i32, InvocationError> {
        match payload.downcast::<StatusSignal>() {
            Ok(signal) if self.sandbox.guard().trust().honours_unwound() => Ok(signal.code()),
            Ok(signal) => {
                warn!(
                    target: TOOL_TARGET,
                    tool = %self.name,
                    code = signal.code(),
                    "ignoring termination request raised outside the entry point"
                );
                Err(InvocationError::UntrustedTermination {
                    tool: self.name.clone(),
                    code: signal.code(),
                })
            }
            Err(other) => Err(InvocationError::Panicked {
                tool: self.name.clone(),
                message: panic_message(other.as_ref()),
            }),
        }
    }
}

/// Marks the current thread as running a guest until dropped.
struct GuestScope;

impl GuestScope {
    fn enter(sandbox: &Arc<Sandbox>) -> Self {
        RUNNING_GUEST.with(|slot| slot.replace(Some(Arc::clone(sandbox))));
        Self
    }
}

impl Drop for GuestScope {
    fn drop(&mut self) {
        RUNNING_GUEST.with(|slot| slot.replace(None));
    }
}

fn route_guest_panics() {
    PANIC_ROUTING.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let routed = RUNNING_GUEST.with(|slot| {
                slot.try_borrow().is_ok_and(|running| {
                    running
                        .as_ref()
                        .is_some_and(|sandbox| writeln!(sandbox.capture().stderr(), "{info}").is_ok())
                })
            });
            if !routed {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return (*message).to_owned();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    String::from("non-string panic payload")
}
