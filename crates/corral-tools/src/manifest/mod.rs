//! Tool manifests naming the entry point of a packaged tool.
//!
//! A tool is packaged either as an archive (a `.jar` or any zip file) or as a
//! bundle directory, each holding `META-INF/MANIFEST.MF`. The manifest uses the JAR manifest syntax: `Name: value` attribute lines, continuation
//! lines that begin with a single space, and a main section that ends at the
//! first blank line. Attribute names are case-insensitive.
//!
//! ```text
//! Manifest-Version: 1.0
//! Main-Class: com.android.tools.r8.D8
//! Native-Library: lib/libd8.so
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use corral_config::MANIFEST_PATH;
use zip::ZipArchive;

use crate::error::LoadError;

/// Leading bytes of a zip local file header.
const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Attribute naming the entry-point symbol.
pub const MAIN_CLASS: &str = "Main-Class";

/// Attribute naming the shared library, relative to the bundle.
pub const NATIVE_LIBRARY: &str = "Native-Library";

/// The main section of a tool manifest.
///
/// # Example
///
/// ```
/// use corral_tools::ToolManifest;
///
/// let manifest = ToolManifest::parse("Manifest-Version: 1.0\nMain-Class: Hello\n")
///     .expect("manifest parses");
/// assert_eq!(manifest.main_class(), "Hello");
/// assert_eq!(manifest.attribute("manifest-version"), Some("1.0"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolManifest {
    main_class: String,
    attributes: BTreeMap<String, String>,
    base_dir: Option<PathBuf>,
}

impl ToolManifest {
    /// Reads the manifest of the tool at `location`.
    ///
    /// A directory is treated as a bundle and its `META-INF/MANIFEST.MF` is
    /// read. A zip archive has the same entry read from inside it. Any other
    /// file is read as the manifest itself. Relative library paths resolve
    /// against the bundle directory, or against the directory holding the
    /// archive or bare manifest.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ManifestUnreadable`] when the file cannot be read,
    /// [`LoadError::ArchiveUnreadable`] when an archive is corrupt or has no
    /// manifest entry, or any error raised by [`ToolManifest::parse`].
    pub fn read(location: &Path) -> Result<Self, LoadError> {
        let (text, base_dir) = if location.is_dir() {
            let manifest_path = location.join(MANIFEST_PATH);
            (read_text(&manifest_path)?, location.to_path_buf())
        } else {
            let parent = location.parent().map(Path::to_path_buf).unwrap_or_default();
            let text = if is_archive(location).map_err(|source| unreadable(location, source))? {
                read_archive_entry(location)?
            } else {
                read_text(location)?
            };
            (text, parent)
        };

        let mut manifest = Self::parse(&text)?;
        manifest.base_dir = Some(base_dir);
        Ok(manifest)
    }

    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedManifest`] for lines that are not valid
    /// attributes, or [`LoadError::MissingEntryPoint`] when `Main-Class` is
    /// absent or blank.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let normalised = text
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n");

        let mut attributes = BTreeMap::new();
        let mut current: Option<(String, String)> = None;

        for (index, line) in normalised.lines().enumerate() {
            let line_number = index + 1;
            if line.is_empty() {
                break;
            }
            if let Some(continuation) = line.strip_prefix(' ') {
                let Some((_, value)) = current.as_mut() else {
                    return Err(malformed(line_number, "continuation line without an attribute"));
                };
                value.push_str(continuation);
                continue;
            }

            let (name, value) = split_attribute(line, line_number)?;
            if let Some((done_name, done_value)) = current.replace((name, value)) {
                attributes.insert(done_name, done_value);
            }
        }
        if let Some((name, value)) = current {
            attributes.insert(name, value);
        }

        let main_class = attributes
            .get(&MAIN_CLASS.to_ascii_lowercase())
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or(LoadError::MissingEntryPoint)?;

        Ok(Self {
            main_class,
            attributes,
            base_dir: None,
        })
    }

    /// Returns the entry-point symbol.
    #[must_use]
    pub const fn main_class(&self) -> &str {
        self.main_class.as_str()
    }

    /// Looks up an attribute of the main section, ignoring case.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the shared library declared by `Native-Library`.
    #[must_use]
    pub fn library(&self) -> Option<PathBuf> {
        let declared = Path::new(self.attribute(NATIVE_LIBRARY)?.trim());
        match &self.base_dir {
            Some(base) => Some(base.join(declared)),
            None => Some(declared.to_path_buf()),
        }
    }

    /// Returns the directory relative paths resolve against, if read from disk.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }
}

fn split_attribute(line: &str, line_number: usize) -> Result<(String, String), LoadError> {
    let (name, value) = line
        .split_once(": ")
        .or_else(|| line.strip_suffix(':').map(|name| (name, "")))
        .ok_or_else(|| malformed(line_number, "expected 'Name: value'"))?;

    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_name {
        return Err(malformed(
            line_number,
            &format!("invalid attribute name '{name}'"),
        ));
    }
    Ok((name.to_ascii_lowercase(), value.to_owned()))
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| unreadable(path, source))
}

fn is_archive(path: &Path) -> io::Result<bool> {
    let mut magic = [0_u8; 4];
    match File::open(path)?.read_exact(&mut magic) {
        Ok(()) => Ok(magic == ZIP_MAGIC),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(error) => Err(error),
    }
}

fn read_archive_entry(path: &Path) -> Result<String, LoadError> {
    let archive_error = |source| LoadError::ArchiveUnreadable {
        path: path.to_path_buf(),
        source: Arc::new(source),
    };
    let file = File::open(path).map_err(|source| unreadable(path, source))?;
    let mut archive = ZipArchive::new(file).map_err(archive_error)?;
    let mut entry = archive.by_name(MANIFEST_PATH).map_err(archive_error)?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|source| unreadable(path, source))?;
    Ok(text)
}

fn unreadable(path: &Path, source: io::Error) -> LoadError {
    LoadError::ManifestUnreadable {
        path: path.to_path_buf(),
        source: Arc::new(source),
    }
}

fn malformed(line: usize, message: &str) -> LoadError {
    LoadError::MalformedManifest {
        line,
        message: message.to_owned(),
    }
}
