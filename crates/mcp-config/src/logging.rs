//! Log settings: the filter expression and the output format.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Filter applied when neither the environment nor a flag overrides it.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Output format of the daemon's logs.
///
/// Parsed case-insensitively from flags and environment variables; written
/// in snake case to configuration files.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Single-line text for terminals.
    Compact,
}

/// Error returned when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;

/// Default filter as a string slice.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default filter as an owned string, for the configuration derive.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default output format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
