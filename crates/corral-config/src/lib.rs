//! Shared configuration for hosts that run tools inside a corral sandbox.
//!
//! [`HostConfig`] is read from a JSON document. Every field has a default,
//! so an empty object is a valid configuration:
//!
//! ```json
//! {
//!   "log_filter": "corral_tools=debug",
//!   "log_format": "compact",
//!   "termination_trust": "direct_only",
//!   "tools": { "d8": "/opt/sdk/d8" }
//! }
//! ```

mod defaults;
mod logging;

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use corral_sandbox::TerminationTrust;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, MANIFEST_PATH, default_log_filter_string, default_log_format,
    default_termination_trust,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Errors raised while loading a [`HostConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The document is not a valid configuration.
    #[error("invalid configuration: {source}")]
    Parse {
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

/// Settings for a tool host and its telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    #[serde(default = "default_log_filter_string")]
    log_filter: String,
    #[serde(default = "default_log_format")]
    log_format: LogFormat,
    #[serde(default = "default_termination_trust")]
    termination_trust: TerminationTrust,
    #[serde(default)]
    tools: BTreeMap<String, Utf8PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            termination_trust: default_termination_trust(),
            tools: BTreeMap::new(),
        }
    }
}

impl HostConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            source: Arc::new(source),
        })
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Self::from_json_str(&text)
    }

    /// Adds or replaces a tool bundle location.
    #[must_use]
    pub fn with_tool(mut self, name: impl Into<String>, location: impl Into<Utf8PathBuf>) -> Self {
        self.tools.insert(name.into(), location.into());
        self
    }

    /// Overrides the termination trust policy.
    #[must_use]
    pub const fn with_termination_trust(mut self, trust: TerminationTrust) -> Self {
        self.termination_trust = trust;
        self
    }

    /// Overrides the log filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Tracing filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Policy for unwound termination requests.
    #[must_use]
    pub const fn termination_trust(&self) -> TerminationTrust {
        self.termination_trust
    }

    /// Tool bundle locations keyed by tool name.
    #[must_use]
    pub const fn tools(&self) -> &BTreeMap<String, Utf8PathBuf> {
        &self.tools
    }
}
