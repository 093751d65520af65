//! Handler capability invoked for a dispatch key.
//!
//! Handlers are external collaborators: the engine hands them the request
//! payload untouched and wraps whatever they return. Failures are values, not
//! panics; a [`HandlerFailure`] carries a [`FailureKind`] the caller can act on
//! and a message for humans.

use std::fmt;
use std::time::Duration;

use mcp_protocol::Payload;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capability that performs the work behind one `(target, action)` key.
///
/// Implementations must be thread-safe: the engine may run many invocations
/// of the same handler at once, each on its own worker thread.
///
/// Closures of the right shape implement the trait directly:
///
/// ```
/// use mcp_engine::{Handler, HandlerFailure};
/// use mcp_protocol::Payload;
///
/// let echo = |payload: &Payload| Ok::<_, HandlerFailure>(payload.clone());
/// assert!(echo.handle(&Payload::new()).is_ok());
/// ```
pub trait Handler: Send + Sync {
    /// Processes `payload` and returns the response payload.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerFailure`] when the operation cannot be completed.
    fn handle(&self, payload: &Payload) -> Result<Payload, HandlerFailure>;
}

impl<F> Handler for F
where
    F: Fn(&Payload) -> Result<Payload, HandlerFailure> + Send + Sync,
{
    fn handle(&self, payload: &Payload) -> Result<Payload, HandlerFailure> {
        self(payload)
    }
}

/// Category of a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The payload does not have the shape the handler expects.
    InvalidPayload,
    /// An entity referenced by the payload does not exist.
    NotFound,
    /// A backing service could not be reached.
    Unavailable,
    /// The backing service rejected or failed the operation.
    QueryFailed,
    /// The invocation exceeded its deadline.
    Timeout,
    /// The handler panicked.
    Panicked,
    /// Any other internal fault.
    Internal,
}

impl FailureKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidPayload => "invalid_payload",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::QueryFailed => "query_failed",
            Self::Timeout => "timeout",
            Self::Panicked => "panicked",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a handler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct HandlerFailure {
    kind: FailureKind,
    message: String,
}

impl HandlerFailure {
    /// Creates a failure of the given kind.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The payload could not be interpreted by the handler.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidPayload, message)
    }

    /// An internal fault inside the handler.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }

    /// The invocation did not finish before `deadline` elapsed.
    #[must_use]
    pub fn timeout(deadline: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("handler did not complete within {}ms", deadline.as_millis()),
        )
    }

    /// The handler panicked before producing a result.
    #[must_use]
    pub fn panicked() -> Self {
        Self::new(
            FailureKind::Panicked,
            "handler terminated abnormally before producing a result",
        )
    }

    /// Category of the failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}
