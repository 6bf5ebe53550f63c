//! Entry points exported from shared libraries.
//!
//! [`LibraryResolver`] opens the library named by a manifest's
//! `Native-Library` attribute with `libloading` and looks up the `Main-Class`
//! symbol in it. The exported item must be a Rust function with the
//! [`EntryFn`] signature, built with the same compiler as the host:
//!
//! ```rust,ignore
//! #[unsafe(no_mangle)]
//! pub fn hello_main(ctx: &GuestContext<'_>, args: &[String]) -> GuestResult {
//!     writeln!(ctx.stdout(), "hello {}", args.join(" "))?;
//!     Err(ctx.exit(0))
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use libloading::Library;
use tracing::debug;

use crate::error::LoadError;
use crate::manifest::ToolManifest;
use crate::resolver::{EntryFn, EntryResolver, LoadedEntryPoint};

/// Tracing target for library loading.
const LIBRARY_TARGET: &str = "corral_tools::library";

/// Resolves entry points from shared libraries declared in manifests.
///
/// Libraries opened by one resolver are cached by path, so several tools in
/// the same library share one mapping.
#[derive(Debug, Default)]
pub struct LibraryResolver {
    opened: Mutex<HashMap<PathBuf, Arc<Library>>>,
}

impl LibraryResolver {
    /// Creates a resolver with an empty library cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&self, path: &Path) -> Result<Arc<Library>, LoadError> {
        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(library) = opened.get(path) {
            return Ok(Arc::clone(library));
        }

        debug!(
            target: LIBRARY_TARGET,
            library = %path.display(),
            "opening tool library"
        );
        // Loading runs the library's initialisers; the manifest is trusted to
        // name a tool library.
        let library = unsafe { Library::new(path) }
            .map(Arc::new)
            .map_err(|source| LoadError::LibraryOpen {
                path: path.to_path_buf(),
                source: Arc::new(source),
            })?;
        opened.insert(path.to_path_buf(), Arc::clone(&library));
        Ok(library)
    }
}

impl EntryResolver for LibraryResolver {
    fn resolve(&self, manifest: &ToolManifest) -> Result<LoadedEntryPoint, LoadError> {
        let symbol = manifest.main_class();
        let path = manifest.library().ok_or_else(|| LoadError::MissingLibrary {
            symbol: symbol.to_owned(),
        })?;
        let library = self.open(&path)?;

        // The exported symbol is trusted to have the `EntryFn` signature.
        let callable = unsafe { library.get::<EntryFn>(symbol.as_bytes()) }
            .map(|exported| *exported)
            .map_err(|source| LoadError::UnresolvedEntryPoint {
                symbol: symbol.to_owned(),
                source: Some(Arc::new(source)),
            })?;

        debug!(
            target: LIBRARY_TARGET,
            library = %path.display(),
            symbol,
            "resolved entry point"
        );
        Ok(LoadedEntryPoint::from_library(
            symbol, &path, callable, library,
        ))
    }
}
