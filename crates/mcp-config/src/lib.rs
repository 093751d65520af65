//! Shared configuration for the message control protocol daemon.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults, then an optional
//! configuration file (`--config-path` or `MCP_CONFIG_PATH`), then `MCP_*`
//! environment variables, then command-line flags. The resolved values drive
//! telemetry, the dispatch deadline, and the stream server limits.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_HANDLER_TIMEOUT_MS, DEFAULT_MAX_HANDLER_WORKERS, DEFAULT_MAX_IN_FLIGHT,
    DEFAULT_MAX_MESSAGE_BYTES,
};
pub use self::logging::{
    DEFAULT_LOG_FILTER, LogFormat, LogFormatParseError, default_log_filter,
    default_log_filter_string, default_log_format,
};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "MCP")]
pub struct Config {
    /// `tracing` filter expression applied to the daemon's logs.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for the daemon's logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Deadline for a single handler invocation in milliseconds; `0` disables it.
    #[ortho_config(default = DEFAULT_HANDLER_TIMEOUT_MS)]
    pub handler_timeout_ms: u64,
    /// Cap on live handler workers, including ones past their deadline.
    #[ortho_config(default = DEFAULT_MAX_HANDLER_WORKERS)]
    pub max_handler_workers: usize,
    /// Maximum accepted length of one inbound message line.
    #[ortho_config(default = DEFAULT_MAX_MESSAGE_BYTES)]
    pub max_message_bytes: usize,
    /// Number of messages the stream server dispatches concurrently.
    #[ortho_config(default = DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: usize,
    /// Enforces UUID and date-time syntax on envelope fields when `true`.
    #[ortho_config(default = true)]
    pub strict_formats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            handler_timeout_ms: DEFAULT_HANDLER_TIMEOUT_MS,
            max_handler_workers: DEFAULT_MAX_HANDLER_WORKERS,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            strict_formats: true,
        }
    }
}

impl Config {
    /// Log filter expression for the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for the telemetry subscriber.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Handler deadline, or `None` when invocations may run indefinitely.
    #[must_use]
    pub const fn handler_timeout(&self) -> Option<Duration> {
        if self.handler_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.handler_timeout_ms))
        }
    }

    /// Cap on live handler workers, never below one.
    #[must_use]
    pub const fn max_handler_workers(&self) -> usize {
        if self.max_handler_workers == 0 {
            1
        } else {
            self.max_handler_workers
        }
    }

    /// Maximum accepted length of one inbound message line.
    #[must_use]
    pub const fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    /// Concurrent dispatch bound for the stream server, never below one.
    #[must_use]
    pub const fn max_in_flight(&self) -> usize {
        if self.max_in_flight == 0 {
            1
        } else {
            self.max_in_flight
        }
    }

    /// Whether UUID and date-time syntax is enforced during validation.
    #[must_use]
    pub const fn strict_formats(&self) -> bool {
        self.strict_formats
    }
}
