//! Domain errors raised while loading and invoking tools.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O and dynamic-loading errors
//! are wrapped in `Arc` to keep the enums small and `Send + Sync`.

use std::path::PathBuf;
use std::sync::Arc;

use corral_sandbox::{PolicyViolation, SandboxError};
use thiserror::Error;

/// Errors raised before any guest code runs.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The manifest file could not be read.
    #[error("failed to read manifest '{path}': {source}")]
    ManifestUnreadable {
        /// Manifest path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The program archive could not be opened or lacks a manifest entry.
    #[error("failed to read manifest from archive '{path}': {source}")]
    ArchiveUnreadable {
        /// Archive path that was opened.
        path: PathBuf,
        /// Underlying archive error.
        #[source]
        source: Arc<zip::result::ZipError>,
    },

    /// The manifest text does not follow the `Name: value` syntax.
    #[error("malformed manifest at line {line}: {message}")]
    MalformedManifest {
        /// One-based line number.
        line: usize,
        /// Description of the syntax error.
        message: String,
    },

    /// The manifest lacks a usable `Main-Class` attribute.
    #[error("manifest does not declare a Main-Class entry point")]
    MissingEntryPoint,

    /// The entry-point symbol could not be found.
    #[error("entry point '{symbol}' could not be resolved")]
    UnresolvedEntryPoint {
        /// Symbol named by the manifest.
        symbol: String,
        /// Optional underlying loader error.
        #[source]
        source: Option<Arc<libloading::Error>>,
    },

    /// Native resolution was requested but the manifest names no library.
    #[error("manifest for '{symbol}' does not declare a Native-Library")]
    MissingLibrary {
        /// Symbol named by the manifest.
        symbol: String,
    },

    /// The shared library could not be opened.
    #[error("failed to open library '{path}': {source}")]
    LibraryOpen {
        /// Library path that was opened.
        path: PathBuf,
        /// Underlying loader error.
        #[source]
        source: Arc<libloading::Error>,
    },

    /// An entry table already holds a callable for this symbol.
    #[error("entry point '{symbol}' is already registered")]
    DuplicateEntryPoint {
        /// Symbol that was registered twice.
        symbol: String,
    },
}

/// Failures raised while a guest runs that are not a status code.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The guest tried to subvert the sandbox.
    #[error("tool '{tool}' attempted to break out of the sandbox: {source}")]
    PolicyViolation {
        /// Tool name.
        tool: String,
        /// The refused action.
        #[source]
        source: PolicyViolation,
    },

    /// The guest reported a failure of its own.
    #[error("tool '{tool}' failed: {source}")]
    Fault {
        /// Tool name.
        tool: String,
        /// The guest's original error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The guest panicked.
    #[error("tool '{tool}' panicked: {message}")]
    Panicked {
        /// Tool name.
        tool: String,
        /// Panic message, when the payload was a string.
        message: String,
    },

    /// The guest unwound with a termination request that policy distrusts.
    #[error("tool '{tool}' requested status {code} from outside its entry point")]
    UntrustedTermination {
        /// Tool name.
        tool: String,
        /// Requested status code.
        code: i32,
    },
}

impl InvocationError {
    /// Returns the name of the tool that failed.
    #[must_use]
    pub fn tool(&self) -> &str {
        match self {
            Self::PolicyViolation { tool, .. }
            | Self::Fault { tool, .. }
            | Self::Panicked { tool, .. }
            | Self::UntrustedTermination { tool, .. } => tool,
        }
    }

    /// Returns `true` when the failure is a sandbox breach.
    #[must_use]
    pub const fn is_policy_violation(&self) -> bool {
        matches!(self, Self::PolicyViolation { .. })
    }
}

/// Errors raised by a [`ToolHost`](crate::ToolHost).
#[derive(Debug, Error)]
pub enum HostError {
    /// No tool with this name has been loaded.
    #[error("tool '{name}' isn't loaded")]
    NotLoaded {
        /// Name that was looked up.
        name: String,
    },

    /// A tool with this name is already loaded.
    #[error("tool '{name}' is already loaded")]
    AlreadyLoaded {
        /// Name that was registered twice.
        name: String,
    },

    /// Loading a tool failed.
    #[error("failed to load tool '{name}': {source}")]
    Load {
        /// Tool name.
        name: String,
        /// Underlying load failure.
        #[source]
        source: LoadError,
    },

    /// The tool failed while running.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// The sandbox could not be installed.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

#[cfg(test)]
mod tests;
