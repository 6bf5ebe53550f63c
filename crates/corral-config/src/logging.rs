//! Output format of the host's own log events.
//!
//! Guest output never reaches the log: it is captured per run. The format
//! only shapes the events the host emits about loading and invoking tools.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How host log events are rendered on standard error.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with event fields flattened to the top level
    /// so tool names and status codes can be filtered on directly.
    #[default]
    Json,
    /// One terse line per event, for reading a harness run in a terminal.
    Compact,
}

impl LogFormat {
    /// Returns `true` when events are emitted as JSON objects.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when a log format name is not recognised.
pub type LogFormatParseError = strum::ParseError;
