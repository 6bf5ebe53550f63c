//! Structured logging set-up for hosts and harnesses.

use std::io::{self, IsTerminal};

use corral_config::HostConfig;
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber described by `config`.
///
/// Only the first successful call installs anything; later calls return a
/// fresh handle and leave the global subscriber alone, even when their
/// configuration differs.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter, or
/// [`TelemetryError::Subscriber`] if another subscriber was already set
/// outside this module.
///
/// # Examples
///
/// ```rust
/// use corral_config::HostConfig;
/// use corral_tools::telemetry;
///
/// # fn main() -> Result<(), corral_tools::telemetry::TelemetryError> {
/// let config = HostConfig::default().with_log_filter("corral_tools=debug");
/// let _handle = telemetry::initialise(&config)?;
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &HostConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn filter_for(config: &HostConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))
}

fn install_subscriber(config: &HostConfig) -> Result<(), TelemetryError> {
    let filter = filter_for(config)?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(io::stderr)
            // Guest output is captured in memory, so stderr stays free for logs.
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = if config.log_format().is_structured() {
        Box::new(builder(filter).json().flatten_event(true).finish())
    } else {
        Box::new(builder(filter).compact().finish())
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
