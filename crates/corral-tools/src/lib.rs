//! Loading and running command-line tools inside the current process.
//!
//! The `corral-tools` crate sits on top of [`corral_sandbox`]. A tool is
//! described by a small manifest whose `Main-Class` attribute names its entry
//! point. An [`EntryResolver`] turns that name into a callable, either from a
//! table of linked functions ([`EntryTable`]) or from a dynamic library named
//! by the manifest ([`LibraryResolver`]).
//!
//! Each run goes through [`Tool::run`], which converts every way a guest can
//! stop into a status code or an [`InvocationError`]. The [`ToolHost`] owns a
//! set of named tools and scopes captured output to a single run.
//!
//! # Example
//!
//! ```rust
//! use std::io::Write;
//!
//! use corral_sandbox::{GuestContext, GuestResult, TerminationTrust};
//! use corral_tools::{EntryTable, ToolHost};
//!
//! fn greet(ctx: &GuestContext<'_>, args: &[String]) -> GuestResult {
//!     write!(ctx.stdout(), "hello {}", args.join(" "))?;
//!     Ok(())
//! }
//!
//! let mut table = EntryTable::new();
//! table.register("Greeter", greet).expect("registration succeeds");
//!
//! let dir = tempfile::tempdir().expect("temp dir");
//! std::fs::create_dir(dir.path().join("META-INF")).expect("meta dir");
//! std::fs::write(dir.path().join("META-INF/MANIFEST.MF"), "Main-Class: Greeter\n")
//!     .expect("write manifest");
//!
//! let mut host = ToolHost::install(TerminationTrust::AnyRequest, table).expect("host installs");
//! host.load("greet", dir.path()).expect("tool loads");
//!
//! let output = host.run("greet", &[String::from("world")]).expect("tool runs");
//! assert!(output.success());
//! assert_eq!(output.stdout(), "hello world");
//! ```

pub mod error;
pub mod host;
pub mod library;
pub mod manifest;
pub mod resolver;
pub mod telemetry;
pub mod tool;

#[cfg(test)]
mod tests;

pub use self::error::{HostError, InvocationError, LoadError};
pub use self::host::{ToolHost, ToolOutput};
pub use self::library::LibraryResolver;
pub use self::manifest::ToolManifest;
pub use self::resolver::{EntryFn, EntryOrigin, EntryResolver, EntryTable, LoadedEntryPoint};
pub use self::telemetry::{TelemetryError, TelemetryHandle};
pub use self::tool::Tool;
