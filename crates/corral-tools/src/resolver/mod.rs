//! Resolution of a manifest's entry-point symbol to a callable.
//!
//! An [`EntryResolver`] turns the `Main-Class` named by a
//! [`ToolManifest`] into a [`LoadedEntryPoint`]. Two resolvers ship with the
//! crate: [`EntryTable`] for entry points linked into the host, and
//! [`LibraryResolver`](crate::library::LibraryResolver) for entry points
//! exported from a shared library.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use corral_sandbox::{GuestContext, GuestResult};
use libloading::Library;

use crate::error::LoadError;
use crate::manifest::ToolManifest;

/// Signature every guest entry point must have.
///
/// The entry point receives the process view and the ordered arguments, and
/// reports termination through the returned [`GuestResult`].
pub type EntryFn = fn(&GuestContext<'_>, &[String]) -> GuestResult;

/// Where an entry point was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Linked into the host process.
    Linked,
    /// Exported by the shared library at this path.
    Library(PathBuf),
}

impl fmt::Display for EntryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linked => f.write_str("linked"),
            Self::Library(path) => write!(f, "library {}", path.display()),
        }
    }
}

/// A resolved entry point, kept callable for its own lifetime.
#[derive(Clone)]
pub struct LoadedEntryPoint {
    symbol: String,
    origin: EntryOrigin,
    callable: EntryFn,
    // Keeps the code behind `callable` mapped.
    library: Option<Arc<Library>>,
}

impl LoadedEntryPoint {
    /// Wraps a callable linked into the host.
    #[must_use]
    pub fn linked(symbol: impl Into<String>, callable: EntryFn) -> Self {
        Self {
            symbol: symbol.into(),
            origin: EntryOrigin::Linked,
            callable,
            library: None,
        }
    }

    pub(crate) fn from_library(
        symbol: impl Into<String>,
        path: &Path,
        callable: EntryFn,
        library: Arc<Library>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            origin: EntryOrigin::Library(path.to_path_buf()),
            callable,
            library: Some(library),
        }
    }

    /// Returns the resolved symbol.
    #[must_use]
    pub const fn symbol(&self) -> &str {
        self.symbol.as_str()
    }

    /// Returns where the symbol was found.
    #[must_use]
    pub const fn origin(&self) -> &EntryOrigin {
        &self.origin
    }

    /// Returns the callable.
    #[must_use]
    pub const fn callable(&self) -> EntryFn {
        self.callable
    }
}

impl fmt::Debug for LoadedEntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedEntryPoint")
            .field("symbol", &self.symbol)
            .field("origin", &self.origin)
            .field("library_mapped", &self.library.is_some())
            .finish_non_exhaustive()
    }
}

/// Resolves the entry point a manifest names.
///
/// # Example
///
/// ```
/// use corral_sandbox::{GuestContext, GuestResult};
/// use corral_tools::{EntryResolver, LoadError, LoadedEntryPoint, ToolManifest};
///
/// fn hello(_ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
///     Ok(())
/// }
///
/// struct Fixed;
///
/// impl EntryResolver for Fixed {
///     fn resolve(&self, manifest: &ToolManifest) -> Result<LoadedEntryPoint, LoadError> {
///         Ok(LoadedEntryPoint::linked(manifest.main_class(), hello))
///     }
/// }
/// ```
pub trait EntryResolver {
    /// Resolves `manifest`'s `Main-Class` to a callable.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the symbol cannot be resolved.
    fn resolve(&self, manifest: &ToolManifest) -> Result<LoadedEntryPoint, LoadError>;
}

impl<R: EntryResolver + ?Sized> EntryResolver for &R {
    fn resolve(&self, manifest: &ToolManifest) -> Result<LoadedEntryPoint, LoadError> {
        (**self).resolve(manifest)
    }
}

/// In-process symbol table of entry points linked into the host.
///
/// # Example
///
/// ```
/// use corral_sandbox::{GuestContext, GuestResult};
/// use corral_tools::{EntryResolver, EntryTable, ToolManifest};
///
/// fn d8(_ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
///     Ok(())
/// }
///
/// let mut table = EntryTable::new();
/// table.register("com.android.tools.r8.D8", d8).expect("registration succeeds");
///
/// let manifest = ToolManifest::parse("Main-Class: com.android.tools.r8.D8\n").expect("parses");
/// let entry = table.resolve(&manifest).expect("resolves");
/// assert_eq!(entry.symbol(), "com.android.tools.r8.D8");
/// ```
#[derive(Clone, Default)]
pub struct EntryTable {
    entries: HashMap<String, EntryFn>,
}

impl EntryTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callable` under `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DuplicateEntryPoint`] if the symbol is taken.
    pub fn register(&mut self, symbol: impl Into<String>, callable: EntryFn) -> Result<(), LoadError> {
        let symbol = symbol.into();
        if self.entries.contains_key(&symbol) {
            return Err(LoadError::DuplicateEntryPoint { symbol });
        }
        self.entries.insert(symbol, callable);
        Ok(())
    }

    /// Returns the callable registered for `symbol`.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<EntryFn> {
        self.entries.get(symbol).copied()
    }

    /// Returns the number of registered entry points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entry points are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for EntryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl EntryResolver for EntryTable {
    fn resolve(&self, manifest: &ToolManifest) -> Result<LoadedEntryPoint, LoadError> {
        let symbol = manifest.main_class();
        self.get(symbol)
            .map(|callable| LoadedEntryPoint::linked(symbol, callable))
            .ok_or_else(|| LoadError::UnresolvedEntryPoint {
                symbol: symbol.to_owned(),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests;
