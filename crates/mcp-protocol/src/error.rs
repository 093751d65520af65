//! Validation failures reported for malformed envelopes.

use thiserror::Error;

/// Reason an inbound value was rejected by the [`Validator`](crate::Validator).
///
/// Each variant names the offending field (where one exists) so callers can
/// report which rule failed rather than a bare "invalid".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The message is not a JSON object.
    #[error("message must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON kind that was received instead.
        found: &'static str,
    },

    /// A required field is absent.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },

    /// A field holds a value of the wrong JSON kind.
    #[error("field '{field}' must be {expected}, found {found}")]
    WrongType {
        /// Name of the offending field.
        field: &'static str,
        /// JSON kind the schema requires.
        expected: &'static str,
        /// JSON kind that was received.
        found: &'static str,
    },

    /// A field that must hold a UUID does not.
    #[error("field '{field}' is not a valid UUID: '{value}'")]
    InvalidUuid {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The timestamp is not an RFC 3339 date-time.
    #[error("field 'timestamp' is not an ISO-8601 date-time: '{value}'")]
    InvalidTimestamp {
        /// Rejected value.
        value: String,
    },

    /// The message type is neither `request` nor `response`.
    #[error("field 'type' must be \"request\" or \"response\", found '{value}'")]
    InvalidMessageType {
        /// Rejected value.
        value: String,
    },

    /// A string field that must carry content is empty.
    #[error("field '{field}' must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A request carries `response_to`, which only responses may hold.
    #[error("field 'response_to' is only allowed on responses")]
    UnexpectedCorrelation,
}

impl ValidationFailure {
    /// Name of the field that failed, or `None` when the whole value was rejected.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::NotAnObject { .. } => None,
            Self::MissingField { field }
            | Self::WrongType { field, .. }
            | Self::InvalidUuid { field, .. }
            | Self::EmptyField { field } => Some(*field),
            Self::InvalidTimestamp { .. } => Some("timestamp"),
            Self::InvalidMessageType { .. } => Some("type"),
            Self::UnexpectedCorrelation => Some("response_to"),
        }
    }

    /// Short identifier of the schema rule that failed.
    #[must_use]
    pub const fn rule(&self) -> &'static str {
        match self {
            Self::NotAnObject { .. } => "object",
            Self::MissingField { .. } => "required",
            Self::WrongType { .. } => "type",
            Self::InvalidUuid { .. } => "uuid",
            Self::InvalidTimestamp { .. } => "date_time",
            Self::InvalidMessageType { .. } => "enum",
            Self::EmptyField { .. } => "non_empty",
            Self::UnexpectedCorrelation => "response_only",
        }
    }
}
