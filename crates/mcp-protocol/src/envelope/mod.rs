//! Envelope data model and constructors.
//!
//! Envelopes are immutable once built. Requests are created by senders through
//! [`Envelope::request`]; the engine answers with a fresh envelope built by
//! [`Envelope::reply`] or [`Envelope::response`], never by mutating the request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::error::ValidationFailure;
use crate::validator::validate;

/// Structured payload and metadata carried by an envelope.
pub type Payload = serde_json::Map<String, Value>;

/// Timestamp used if the system clock cannot be rendered as RFC 3339.
const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Kind of envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// A message asking a handler to perform an action.
    Request,
    /// A message answering a previously received request.
    Response,
}

impl MessageType {
    /// Parses the wire representation (case-sensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "request" => Some(Self::Request),
            "response" => Some(Self::Response),
            _ => None,
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

/// A protocol message.
///
/// Serialises to the wire shape, with `message_type` written as `type` and the
/// optional fields omitted when absent. Deserialisation goes through the
/// strict [`Validator`](crate::Validator), so a decoded envelope always honours
/// the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Envelope {
    id: String,
    timestamp: String,
    #[serde(rename = "type")]
    message_type: MessageType,
    action: String,
    target: String,
    payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Payload>,
}

/// Field values of an envelope that has already passed validation.
pub(crate) struct EnvelopeParts {
    pub(crate) id: String,
    pub(crate) timestamp: String,
    pub(crate) message_type: MessageType,
    pub(crate) action: String,
    pub(crate) target: String,
    pub(crate) payload: Payload,
    pub(crate) response_to: Option<String>,
    pub(crate) metadata: Option<Payload>,
}

impl Envelope {
    /// Creates a request with a fresh identifier and the current UTC time.
    ///
    /// # Example
    ///
    /// ```
    /// use mcp_protocol::{Envelope, MessageType, Payload};
    ///
    /// let request = Envelope::request("run_cypher_query", "neo4j", Payload::new(), None);
    /// assert_eq!(request.message_type(), MessageType::Request);
    /// assert!(request.response_to().is_none());
    /// ```
    #[must_use]
    pub fn request(
        action: impl Into<String>,
        target: impl Into<String>,
        payload: Payload,
        metadata: Option<Payload>,
    ) -> Self {
        Self {
            id: fresh_id(),
            timestamp: now_timestamp(),
            message_type: MessageType::Request,
            action: action.into(),
            target: target.into(),
            payload,
            response_to: None,
            metadata,
        }
    }

    /// Creates a response answering the message identified by `response_to`.
    ///
    /// Used directly when no typed request is available, for example when the
    /// inbound value failed validation.
    #[must_use]
    pub fn response(
        response_to: impl Into<String>,
        target: impl Into<String>,
        action: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            id: fresh_id(),
            timestamp: now_timestamp(),
            message_type: MessageType::Response,
            action: action.into(),
            target: target.into(),
            payload,
            response_to: Some(response_to.into()),
            metadata: None,
        }
    }

    /// Creates a response to this envelope, echoing its target and action.
    #[must_use]
    pub fn reply(&self, payload: Payload) -> Self {
        Self::response(
            self.id.as_str(),
            self.target.as_str(),
            self.action.as_str(),
            payload,
        )
    }

    pub(crate) fn from_parts(parts: EnvelopeParts) -> Self {
        Self {
            id: parts.id,
            timestamp: parts.timestamp,
            message_type: parts.message_type,
            action: parts.action,
            target: parts.target,
            payload: parts.payload,
            response_to: parts.response_to,
            metadata: parts.metadata,
        }
    }

    /// Unique message identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Creation time as an RFC 3339 string.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        self.timestamp.as_str()
    }

    /// Whether this is a request or a response.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Returns `true` for request envelopes.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self.message_type, MessageType::Request)
    }

    /// Opaque verb, half of the dispatch key.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Opaque namespace, half of the dispatch key.
    #[must_use]
    pub fn target(&self) -> &str {
        self.target.as_str()
    }

    /// Payload handed to the matched handler untouched.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Identifier of the request a response answers.
    #[must_use]
    pub fn response_to(&self) -> Option<&str> {
        self.response_to.as_deref()
    }

    /// Sender-supplied metadata, never interpreted by the engine.
    #[must_use]
    pub const fn metadata(&self) -> Option<&Payload> {
        self.metadata.as_ref()
    }

    /// Converts the envelope into its wire-shaped JSON value.
    ///
    /// # Errors
    ///
    /// Returns the encoder's error if the envelope cannot be represented as a
    /// JSON value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl TryFrom<Value> for Envelope {
    type Error = ValidationFailure;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        validate(&raw)
    }
}

/// Generates a fresh message identifier.
#[must_use]
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Renders the current UTC time as RFC 3339.
#[must_use]
pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| EPOCH_TIMESTAMP.to_owned())
}

#[cfg(test)]
mod tests;
