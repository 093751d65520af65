//! Daemon bootstrap orchestration.

use std::io::{BufRead, Write};
use std::sync::Arc;

use mcp_config::Config;
use mcp_engine::{DispatchEngine, EngineOptions, HandlerRegistry, RegistryError};
use mcp_graph::{GraphStore, StoreError, register_graph_handlers};
use mcp_protocol::ValidationOptions;
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use crate::health::HealthReporter;
use crate::stream::{self, StreamError, StreamOptions, StreamSummary};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no valid configuration can be built.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The graph store could not be reached.
    #[error("graph store is unreachable: {source}")]
    Store {
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// Handler registration failed.
    #[error("failed to register handlers: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
}

/// A bootstrapped daemon ready to serve.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    engine: DispatchEngine,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Engine answering inbound messages.
    #[must_use]
    pub const fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Serves newline-delimited envelopes from `reader` until end of input.
    ///
    /// # Errors
    ///
    /// Returns a [`StreamError`] if the streams fail.
    pub fn serve<R, W>(&self, reader: R, writer: W) -> Result<StreamSummary, StreamError>
    where
        R: BufRead,
        W: Write + Send,
    {
        stream::serve(
            &self.engine,
            reader,
            writer,
            StreamOptions::from_config(&self.config),
        )
    }
}

/// Translates configuration into engine options.
#[must_use]
pub const fn engine_options(config: &Config) -> EngineOptions {
    EngineOptions::new()
        .with_validation(ValidationOptions::with_strict_formats(
            config.strict_formats(),
        ))
        .with_handler_timeout(config.handler_timeout())
        .with_max_workers(config.max_handler_workers())
}

/// Bootstraps the daemon over `store` with the graph handlers registered.
///
/// # Errors
///
/// Returns a [`BootstrapError`] for the first stage that fails.
pub fn bootstrap(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
    store: &Arc<dyn GraphStore>,
) -> Result<Daemon, BootstrapError> {
    bootstrap_with(loader, reporter, store.as_ref(), |registry| {
        register_graph_handlers(registry, store)
    })
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Loads configuration, installs telemetry, checks that `store` is reachable,
/// fills the handler registry through `register`, and builds the engine.
/// Every failure is reported to `reporter` before it is returned.
///
/// # Errors
///
/// Returns a [`BootstrapError`] for the first stage that fails. An
/// unreachable store and a duplicate handler registration are both fatal.
pub fn bootstrap_with<F>(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
    store: &dyn GraphStore,
    register: F,
) -> Result<Daemon, BootstrapError>
where
    F: FnOnce(&mut HandlerRegistry) -> Result<(), RegistryError>,
{
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    reporter.bootstrap_starting();

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;

    store
        .ping()
        .map_err(|source| fail(BootstrapError::Store { source }))?;
    reporter.store_connected();

    let mut registry = HandlerRegistry::new();
    register(&mut registry).map_err(|source| fail(BootstrapError::Registry { source }))?;
    for key in registry.keys() {
        reporter.handler_registered(&key);
    }

    let engine = DispatchEngine::with_options(registry, engine_options(&config));
    reporter.bootstrap_succeeded(&config);

    Ok(Daemon {
        config,
        engine,
        telemetry,
    })
}
