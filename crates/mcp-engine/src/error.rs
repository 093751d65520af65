//! Error types for registration and dispatch.
//!
//! [`RegistryError`] is raised while wiring handlers at startup and is meant to
//! abort initialisation. [`DispatchError`] covers every per-message failure;
//! the engine never propagates it, it converts it into the payload of an error
//! response via [`DispatchError::to_payload`].

use mcp_protocol::{MessageType, Payload, ValidationFailure};
use serde_json::Value;
use thiserror::Error;

use crate::handler::HandlerFailure;

/// Errors raised while populating a [`HandlerRegistry`](crate::HandlerRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A handler is already registered for the key.
    #[error("a handler is already registered for target '{target}' action '{action}'")]
    Conflict {
        /// Target half of the duplicated key.
        target: String,
        /// Action half of the duplicated key.
        action: String,
    },

    /// The key can never match a valid envelope.
    #[error("dispatch key target '{target}' action '{action}' must not be empty")]
    EmptyKey {
        /// Target half of the rejected key.
        target: String,
        /// Action half of the rejected key.
        action: String,
    },
}

/// Per-message failures, each rendered as an error response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The inbound bytes are not a JSON document.
    #[error("malformed message: {message}")]
    Malformed {
        /// Parser diagnostic.
        message: String,
    },

    /// The inbound message exceeds the configured size limit.
    #[error("message too large: {size} bytes exceeds {max_size} byte limit")]
    TooLarge {
        /// Observed size in bytes.
        size: usize,
        /// Configured limit in bytes.
        max_size: usize,
    },

    /// The message does not conform to the envelope schema.
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationFailure),

    /// Only requests are dispatchable.
    #[error("messages of type '{message_type}' cannot be dispatched; only requests are accepted")]
    UnsupportedMessageType {
        /// Wire name of the rejected type.
        message_type: &'static str,
    },

    /// No handler is registered for the key.
    #[error("no handler registered for target '{target}' action '{action}'")]
    NoHandler {
        /// Requested target.
        target: String,
        /// Requested action.
        action: String,
    },

    /// The matched handler failed.
    #[error("handler for target '{target}' action '{action}' failed: {failure}")]
    Handler {
        /// Target of the failed request.
        target: String,
        /// Action of the failed request.
        action: String,
        /// Failure reported by the handler.
        #[source]
        failure: HandlerFailure,
    },
}

impl DispatchError {
    /// Creates a malformed-message error from a JSON parser error.
    #[must_use]
    pub fn from_json_error(source: &serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
        }
    }

    /// Creates a malformed-message error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a size-limit error.
    #[must_use]
    pub const fn too_large(size: usize, max_size: usize) -> Self {
        Self::TooLarge { size, max_size }
    }

    /// Creates an error rejecting a non-request envelope.
    #[must_use]
    pub const fn unsupported_message_type(message_type: MessageType) -> Self {
        Self::UnsupportedMessageType {
            message_type: message_type.as_str(),
        }
    }

    /// Creates an unknown-route error.
    #[must_use]
    pub fn no_handler(target: impl Into<String>, action: impl Into<String>) -> Self {
        Self::NoHandler {
            target: target.into(),
            action: action.into(),
        }
    }

    /// Wraps a handler failure with the key it occurred under.
    #[must_use]
    pub fn handler(
        target: impl Into<String>,
        action: impl Into<String>,
        failure: HandlerFailure,
    ) -> Self {
        Self::Handler {
            target: target.into(),
            action: action.into(),
            failure,
        }
    }

    /// Error marker written to the `error` field of the response payload.
    ///
    /// Distinguishes malformed messages, unknown routes, rejected message
    /// types, and handler failures.
    #[must_use]
    pub const fn marker(&self) -> &'static str {
        match self {
            Self::Malformed { .. } | Self::TooLarge { .. } | Self::Validation(_) => {
                "invalid_message"
            }
            Self::UnsupportedMessageType { .. } => "unsupported_message_type",
            Self::NoHandler { .. } => "no_handler",
            Self::Handler { .. } => "handler_failure",
        }
    }

    /// Builds the payload of the error response for this failure.
    ///
    /// Every payload carries `error` (the [`marker`](Self::marker)) and a
    /// human-readable `message`, plus fields specific to the failure.
    #[must_use]
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("error".to_owned(), Value::from(self.marker()));
        match self {
            Self::Malformed { .. } => {
                payload.insert("rule".to_owned(), Value::from("json"));
                payload.insert("message".to_owned(), Value::from(self.to_string()));
            }
            Self::TooLarge { .. } => {
                payload.insert("rule".to_owned(), Value::from("max_size"));
                payload.insert("message".to_owned(), Value::from(self.to_string()));
            }
            Self::Validation(failure) => {
                if let Some(field) = failure.field() {
                    payload.insert("field".to_owned(), Value::from(field));
                }
                payload.insert("rule".to_owned(), Value::from(failure.rule()));
                payload.insert("message".to_owned(), Value::from(failure.to_string()));
            }
            Self::UnsupportedMessageType { message_type } => {
                payload.insert("type".to_owned(), Value::from(*message_type));
                payload.insert("message".to_owned(), Value::from(self.to_string()));
            }
            Self::NoHandler { target, action } => {
                payload.insert("target".to_owned(), Value::from(target.as_str()));
                payload.insert("action".to_owned(), Value::from(action.as_str()));
                payload.insert("message".to_owned(), Value::from(self.to_string()));
            }
            Self::Handler { failure, .. } => {
                payload.insert("kind".to_owned(), Value::from(failure.kind().as_str()));
                payload.insert("message".to_owned(), Value::from(failure.message()));
            }
        }
        payload
    }
}
