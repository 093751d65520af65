//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use mcp_config::Config;
use mcp_engine::DispatchKey;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the graph store has answered its startup ping.
    fn store_connected(&self);

    /// Invoked once per handler placed in the registry.
    fn handler_registered(&self, key: &DispatchKey);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn store_connected(&self) {
        (**self).store_connected();
    }

    fn handler_registered(&self, key: &DispatchKey) {
        (**self).handler_registered(key);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            handler_timeout_ms = config.handler_timeout_ms,
            max_handler_workers = config.max_handler_workers(),
            max_message_bytes = config.max_message_bytes(),
            max_in_flight = config.max_in_flight(),
            strict_formats = config.strict_formats(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn store_connected(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "store_connected",
            "graph store reachable"
        );
    }

    fn handler_registered(&self, key: &DispatchKey) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "handler_registered",
            dispatch_target = key.target(),
            action = key.action(),
            "handler registered"
        );
    }
}
