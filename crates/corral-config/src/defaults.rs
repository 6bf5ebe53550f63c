use corral_sandbox::TerminationTrust;

/// Default log filter expression used by harness drivers.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Conventional location of the manifest inside a tool bundle.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default policy for unwound termination requests.
#[must_use]
pub const fn default_termination_trust() -> TerminationTrust {
    TerminationTrust::AnyRequest
}
