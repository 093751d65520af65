//! Validate, route, invoke, and answer.
//!
//! [`DispatchEngine::process`] is total: every input, however malformed,
//! produces exactly one response envelope. Failures are logged and rendered
//! through [`DispatchError::to_payload`].

mod invoke;

use std::time::Duration;

use mcp_protocol::envelope::fresh_id;
use mcp_protocol::{Envelope, Payload, ValidationOptions, Validator};
use serde_json::Value;
use tracing::{debug, warn};

use self::invoke::WorkerPool;
use crate::error::DispatchError;
use crate::registry::HandlerRegistry;

/// Tracing target for dispatch events.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Handler deadline applied unless configured otherwise.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Handler workers allowed to be alive at once unless configured otherwise.
pub const DEFAULT_MAX_WORKERS: usize = 256;

/// Target echoed by error responses when the inbound value has none.
pub const FALLBACK_TARGET: &str = "engine";

/// Action echoed by error responses when the inbound value has none.
pub const FALLBACK_ACTION: &str = "error";

/// Engine tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    validation: ValidationOptions,
    handler_timeout: Option<Duration>,
    max_workers: usize,
}

impl EngineOptions {
    /// Strict validation with the default handler deadline and worker cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validation: ValidationOptions::strict(),
            handler_timeout: Some(DEFAULT_HANDLER_TIMEOUT),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// Replaces the validation options.
    #[must_use]
    pub const fn with_validation(mut self, validation: ValidationOptions) -> Self {
        self.validation = validation;
        self
    }

    /// Replaces the handler deadline; `None` waits indefinitely.
    #[must_use]
    pub const fn with_handler_timeout(mut self, handler_timeout: Option<Duration>) -> Self {
        self.handler_timeout = handler_timeout;
        self
    }

    /// Caps the handler workers alive at once, including workers still running
    /// after their deadline expired. Raised to at least one.
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = if max_workers == 0 { 1 } else { max_workers };
        self
    }

    /// Validation options in effect.
    #[must_use]
    pub const fn validation(&self) -> ValidationOptions {
        self.validation
    }

    /// Handler deadline in effect.
    #[must_use]
    pub const fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout
    }

    /// Worker cap in effect.
    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes validated requests to registered handlers.
///
/// The engine owns its registry and never mutates it, so a single instance
/// can be shared across threads behind a plain reference or `Arc`.
#[derive(Debug)]
pub struct DispatchEngine {
    registry: HandlerRegistry,
    validator: Validator,
    handler_timeout: Option<Duration>,
    workers: WorkerPool,
}

impl DispatchEngine {
    /// Creates an engine with default options.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self::with_options(registry, EngineOptions::default())
    }

    /// Creates an engine with explicit options.
    #[must_use]
    pub fn with_options(registry: HandlerRegistry, options: EngineOptions) -> Self {
        Self {
            registry,
            validator: Validator::new(options.validation()),
            handler_timeout: options.handler_timeout(),
            workers: WorkerPool::new(options.max_workers()),
        }
    }

    /// Registry the engine routes through.
    #[must_use]
    pub const fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Options the engine was built with.
    #[must_use]
    pub const fn options(&self) -> EngineOptions {
        EngineOptions {
            validation: self.validator.options(),
            handler_timeout: self.handler_timeout,
            max_workers: self.workers.limit(),
        }
    }

    /// Processes one decoded inbound value and returns its response.
    #[must_use]
    pub fn process(&self, raw: &Value) -> Envelope {
        match self.validator.validate(raw) {
            Ok(envelope) => self.answer(&envelope),
            Err(failure) => {
                warn!(
                    target: DISPATCH_TARGET,
                    field = failure.field(),
                    rule = failure.rule(),
                    %failure,
                    "rejected invalid message"
                );
                Self::reject(Some(raw), &DispatchError::from(failure))
            }
        }
    }

    /// Decodes one JSON document from `line` and processes it.
    ///
    /// Surrounding whitespace is ignored. Bytes that do not decode as JSON
    /// produce an `invalid_message` response with a fresh correlation id.
    #[must_use]
    pub fn process_line(&self, line: &[u8]) -> Envelope {
        match serde_json::from_slice::<Value>(line.trim_ascii()) {
            Ok(raw) => self.process(&raw),
            Err(source) => {
                let error = DispatchError::from_json_error(&source);
                warn!(target: DISPATCH_TARGET, %error, "rejected malformed message");
                Self::reject(None, &error)
            }
        }
    }

    /// Routes a validated envelope and returns the handler's result payload.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedMessageType`] for non-requests,
    /// [`DispatchError::NoHandler`] when nothing is registered for the key, and
    /// [`DispatchError::Handler`] when the handler fails, times out, panics,
    /// or cannot start because the worker cap is reached.
    pub fn dispatch(&self, envelope: &Envelope) -> Result<Payload, DispatchError> {
        if !envelope.is_request() {
            return Err(DispatchError::unsupported_message_type(
                envelope.message_type(),
            ));
        }

        let (target, action) = (envelope.target(), envelope.action());
        let handler = self
            .registry
            .lookup(target, action)
            .ok_or_else(|| DispatchError::no_handler(target, action))?;

        debug!(
            target: DISPATCH_TARGET,
            id = envelope.id(),
            dispatch_target = target,
            action,
            "dispatching request"
        );

        invoke::invoke(
            &self.workers,
            handler,
            envelope.payload().clone(),
            self.handler_timeout,
        )
            .map_err(|failure| DispatchError::handler(target, action, failure))
    }

    /// Builds the error response for `error`.
    ///
    /// Correlation and routing fields are salvaged from `raw` when it is an
    /// object carrying them as non-empty strings: `id` becomes `response_to`,
    /// and `target` and `action` are echoed. Anything missing is replaced by a
    /// fresh id, [`FALLBACK_TARGET`], or [`FALLBACK_ACTION`].
    #[must_use]
    pub fn reject(raw: Option<&Value>, error: &DispatchError) -> Envelope {
        let response_to = salvage(raw, "id").map_or_else(fresh_id, str::to_owned);
        Envelope::response(
            response_to,
            salvage(raw, "target").unwrap_or(FALLBACK_TARGET),
            salvage(raw, "action").unwrap_or(FALLBACK_ACTION),
            error.to_payload(),
        )
    }

    fn answer(&self, envelope: &Envelope) -> Envelope {
        match self.dispatch(envelope) {
            Ok(result) => {
                debug!(
                    target: DISPATCH_TARGET,
                    id = envelope.id(),
                    "handler completed"
                );
                envelope.reply(result)
            }
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    id = envelope.id(),
                    marker = error.marker(),
                    %error,
                    "dispatch failed"
                );
                envelope.reply(error.to_payload())
            }
        }
    }
}

fn salvage<'a>(raw: Option<&'a Value>, field: &str) -> Option<&'a str> {
    raw.and_then(|value| value.get(field))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests;
