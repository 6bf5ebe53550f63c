//! Named tools sharing one sandbox.
//!
//! The [`ToolHost`] is the public-facing API a test harness calls. It keeps
//! loaded tools by name and runs them through the strict
//! clear → run → drain → clear sequence on the shared capture. Runs are
//! serialised by a gate, so a host may be shared between threads. Hosts made
//! with [`ToolHost::sibling`] share the gate as well as the sandbox.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use corral_config::HostConfig;
use corral_sandbox::{Sandbox, TerminationTrust};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HostError, LoadError};
use crate::manifest::ToolManifest;
use crate::resolver::EntryResolver;
use crate::tool::Tool;

/// Tracing target for host operations.
const HOST_TARGET: &str = "corral_tools::host";

/// Status code and captured text of one tool run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    status: i32,
    stdout: String,
    stderr: String,
}

impl ToolOutput {
    /// Creates an output record.
    #[must_use]
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> i32 {
        self.status
    }

    /// Returns `true` for status `0`.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }

    /// Returns the captured standard output.
    #[must_use]
    pub const fn stdout(&self) -> &str {
        self.stdout.as_str()
    }

    /// Returns the captured standard error.
    #[must_use]
    pub const fn stderr(&self) -> &str {
        self.stderr.as_str()
    }
}

/// Loads tools through a resolver and runs them one at a time.
///
/// # Example
///
/// ```
/// use std::io::Write;
///
/// use corral_sandbox::{GuestContext, GuestResult, TerminationTrust};
/// use corral_tools::{EntryTable, ToolHost};
///
/// fn javac(ctx: &GuestContext<'_>, args: &[String]) -> GuestResult {
///     writeln!(ctx.stderr(), "error: file not found: {}", args.join(" "))?;
///     Err(ctx.exit(2))
/// }
///
/// let mut table = EntryTable::new();
/// table.register("com.sun.tools.javac.Main", javac).expect("registration succeeds");
///
/// let dir = tempfile::tempdir().expect("temp dir");
/// let manifest = dir.path().join("javac.mf");
/// std::fs::write(&manifest, "Main-Class: com.sun.tools.javac.Main\n").expect("write");
///
/// let mut host = ToolHost::install(TerminationTrust::AnyRequest, table).expect("host installs");
/// host.load("javac", &manifest).expect("tool loads");
///
/// let output = host.run("javac", &[String::from("Missing.java")]).expect("tool runs");
/// assert_eq!(output.status(), 2);
/// assert_eq!(output.stderr(), "error: file not found: Missing.java\n");
/// ```
#[derive(Debug)]
pub struct ToolHost<R> {
    sandbox: Arc<Sandbox>,
    resolver: R,
    tools: BTreeMap<String, Tool>,
    gate: Arc<Mutex<()>>,
}

impl<R> ToolHost<R> {
    /// Creates a host over an existing sandbox.
    ///
    /// The host gets a gate of its own. Two hosts created this way over the
    /// same sandbox can interleave their runs on the shared capture; use
    /// [`sibling`](Self::sibling) for a second host on the same sandbox.
    #[must_use]
    pub fn new(sandbox: Arc<Sandbox>, resolver: R) -> Self {
        Self {
            sandbox,
            resolver,
            tools: BTreeMap::new(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Creates an empty host sharing this host's sandbox and gate.
    ///
    /// Runs on either host are serialised against each other.
    #[must_use]
    pub fn sibling<S>(&self, resolver: S) -> ToolHost<S> {
        ToolHost {
            sandbox: Arc::clone(&self.sandbox),
            resolver,
            tools: BTreeMap::new(),
            gate: Arc::clone(&self.gate),
        }
    }

    /// Installs a fresh sandbox and creates a host over it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Sandbox`] if installation fails.
    pub fn install(trust: TerminationTrust, resolver: R) -> Result<Self, HostError> {
        let sandbox = Sandbox::install(trust)?;
        Ok(Self::new(Arc::new(sandbox), resolver))
    }

    /// Returns the shared sandbox.
    #[must_use]
    pub const fn sandbox(&self) -> &Arc<Sandbox> {
        &self.sandbox
    }

    /// Returns the resolver used for loading.
    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Returns `true` when a tool with this name is loaded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the loaded tool names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Returns the number of loaded tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tools are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs a loaded tool and returns its status and captured text.
    ///
    /// Buffers are cleared before the run and again after draining, so the
    /// output belongs to this run alone.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotLoaded`] for unknown names, or
    /// [`HostError::Invocation`] when the tool fails without a status code.
    pub fn run(&self, name: &str, args: &[String]) -> Result<ToolOutput, HostError> {
        let tool = self.tools.get(name).ok_or_else(|| HostError::NotLoaded {
            name: name.to_owned(),
        })?;

        // The gate protects the capture, not any data of its own.
        let _turn = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let capture = self.sandbox.capture();
        capture.clear();
        let outcome = tool.run(args);
        let stdout = capture.drain_output();
        let stderr = capture.drain_error();
        capture.clear();

        match outcome {
            Ok(status) => Ok(ToolOutput {
                status,
                stdout,
                stderr,
            }),
            Err(error) => {
                if !stderr.is_empty() {
                    debug!(
                        target: HOST_TARGET,
                        tool = name,
                        stderr = %stderr.trim(),
                        "captured stderr of failed invocation"
                    );
                }
                Err(error.into())
            }
        }
    }
}

impl<R: EntryResolver> ToolHost<R> {
    /// Installs a sandbox and loads every tool listed in `config`.
    ///
    /// # Errors
    ///
    /// Returns the first [`HostError`] raised while installing the sandbox or
    /// loading a tool.
    pub fn from_config(config: &HostConfig, resolver: R) -> Result<Self, HostError> {
        let mut host = Self::install(config.termination_trust(), resolver)?;
        for (name, location) in config.tools() {
            host.load(name, location.as_std_path())?;
        }
        Ok(host)
    }

    /// Loads the tool at `location` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AlreadyLoaded`] if the name is taken, or
    /// [`HostError::Load`] if the tool cannot be loaded.
    pub fn load(&mut self, name: &str, location: &Path) -> Result<(), HostError> {
        if self.tools.contains_key(name) {
            return Err(HostError::AlreadyLoaded {
                name: name.to_owned(),
            });
        }
        let manifest = ToolManifest::read(location)
            .map_err(|source| load_error(name, source))?;
        let tool = Tool::from_manifest(name, &manifest, &self.resolver, Arc::clone(&self.sandbox))
            .map_err(|source| load_error(name, source))?;
        debug!(
            target: HOST_TARGET,
            tool = name,
            location = %location.display(),
            "tool registered"
        );
        self.tools.insert(name.to_owned(), tool);
        Ok(())
    }
}

fn load_error(name: &str, source: LoadError) -> HostError {
    HostError::Load {
        name: name.to_owned(),
        source,
    }
}

#[cfg(test)]
mod tests;
