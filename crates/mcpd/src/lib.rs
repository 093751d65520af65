//! Daemon hosting the message control protocol dispatch engine.
//!
//! The daemon loads [`mcp_config::Config`], installs structured telemetry on
//! stderr, checks that the graph store answers, registers the graph handlers,
//! and then serves newline-delimited JSON envelopes: one request per inbound
//! line, one response per outbound line. Health reporting hooks emit a
//! structured event at each bootstrap stage so operators can see why a
//! start-up failed.
//!
//! An unreachable store is fatal, as is a registration conflict: a daemon
//! whose routing table is ambiguous never starts serving.

mod bootstrap;
mod health;
pub mod stream;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap,
    bootstrap_with, engine_options,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use stream::{StreamError, StreamOptions, StreamSummary, serve};
pub use telemetry::{TelemetryError, TelemetryHandle};
