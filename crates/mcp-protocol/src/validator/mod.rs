//! Structural schema validation for inbound envelopes.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the value is an object;
//! 2. `id`, `timestamp`, `type`, `action`, `target`, and `payload` are present;
//! 3. `id` is a UUID string;
//! 4. `timestamp` is an RFC 3339 date-time string;
//! 5. `type` is `request` or `response`;
//! 6. `action` and `target` are non-empty strings;
//! 7. `payload` is an object;
//! 8. `response_to`, when present, is a UUID string, and only responses carry
//!    it;
//! 9. `metadata`, when present, is an object (its keys are not inspected).
//!
//! With [`ValidationOptions::lenient`] the UUID and date-time syntax checks are
//! reduced to "is a string".

use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::envelope::{Envelope, EnvelopeParts, MessageType, Payload};
use crate::error::ValidationFailure;

/// Fields every envelope must carry, in the order their presence is checked.
pub const REQUIRED_FIELDS: [&str; 6] = ["id", "timestamp", "type", "action", "target", "payload"];

/// Length of the canonical hyphenated UUID form.
const HYPHENATED_UUID_LEN: usize = 36;

/// Tunables for envelope validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    strict_formats: bool,
}

impl ValidationOptions {
    /// Enforces UUID and date-time syntax.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            strict_formats: true,
        }
    }

    /// Accepts any string for UUID and date-time fields.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            strict_formats: false,
        }
    }

    /// Builds options from a strictness flag.
    #[must_use]
    pub const fn with_strict_formats(strict_formats: bool) -> Self {
        Self { strict_formats }
    }

    /// Whether UUID and date-time syntax is enforced.
    #[must_use]
    pub const fn strict_formats(&self) -> bool {
        self.strict_formats
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::strict()
    }
}

/// Validates raw JSON values into typed envelopes.
///
/// Holds no state beyond its options, so validating the same value twice
/// always yields the same outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    /// Creates a validator with the given options.
    #[must_use]
    pub const fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> ValidationOptions {
        self.options
    }

    /// Checks `raw` against the envelope schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationFailure`] encountered, in the order
    /// documented at module level.
    pub fn validate(&self, raw: &Value) -> Result<Envelope, ValidationFailure> {
        let object = raw.as_object().ok_or_else(|| ValidationFailure::NotAnObject {
            found: json_kind(raw),
        })?;

        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(ValidationFailure::MissingField { field });
            }
        }

        let id = self.uuid_field(object, "id")?;
        let timestamp = self.timestamp_field(object)?;
        let message_type = message_type_field(object)?;
        let action = non_empty_string_field(object, "action")?;
        let target = non_empty_string_field(object, "target")?;
        let payload = object_field(object, "payload")?;

        let response_to = object
            .contains_key("response_to")
            .then(|| self.uuid_field(object, "response_to"))
            .transpose()?;
        if message_type == MessageType::Request && response_to.is_some() {
            return Err(ValidationFailure::UnexpectedCorrelation);
        }
        let metadata = object
            .contains_key("metadata")
            .then(|| object_field(object, "metadata"))
            .transpose()?;

        Ok(Envelope::from_parts(EnvelopeParts {
            id,
            timestamp,
            message_type,
            action,
            target,
            payload,
            response_to,
            metadata,
        }))
    }

    fn uuid_field(&self, object: &Payload, field: &'static str) -> Result<String, ValidationFailure> {
        let value = string_field(object, field)?;
        if self.options.strict_formats && !is_uuid(value) {
            return Err(ValidationFailure::InvalidUuid {
                field,
                value: value.to_owned(),
            });
        }
        Ok(value.to_owned())
    }

    fn timestamp_field(&self, object: &Payload) -> Result<String, ValidationFailure> {
        let value = string_field(object, "timestamp")?;
        if self.options.strict_formats && OffsetDateTime::parse(value, &Rfc3339).is_err() {
            return Err(ValidationFailure::InvalidTimestamp {
                value: value.to_owned(),
            });
        }
        Ok(value.to_owned())
    }
}

/// Validates `raw` with strict format checking.
///
/// # Errors
///
/// Returns the first [`ValidationFailure`] encountered.
pub fn validate(raw: &Value) -> Result<Envelope, ValidationFailure> {
    Validator::default().validate(raw)
}

/// Returns `true` when `value` is a UUID in canonical hyphenated form.
#[must_use]
pub fn is_uuid(value: &str) -> bool {
    value.len() == HYPHENATED_UUID_LEN && Uuid::try_parse(value).is_ok()
}

/// Names the JSON kind of a value for error messages.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn present<'a>(object: &'a Payload, field: &'static str) -> Result<&'a Value, ValidationFailure> {
    object
        .get(field)
        .ok_or(ValidationFailure::MissingField { field })
}

fn string_field<'a>(object: &'a Payload, field: &'static str) -> Result<&'a str, ValidationFailure> {
    let value = present(object, field)?;
    value.as_str().ok_or_else(|| ValidationFailure::WrongType {
        field,
        expected: "a string",
        found: json_kind(value),
    })
}

fn non_empty_string_field(
    object: &Payload,
    field: &'static str,
) -> Result<String, ValidationFailure> {
    let value = string_field(object, field)?;
    if value.is_empty() {
        return Err(ValidationFailure::EmptyField { field });
    }
    Ok(value.to_owned())
}

fn object_field(object: &Payload, field: &'static str) -> Result<Payload, ValidationFailure> {
    let value = present(object, field)?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ValidationFailure::WrongType {
            field,
            expected: "an object",
            found: json_kind(value),
        })
}

fn message_type_field(object: &Payload) -> Result<MessageType, ValidationFailure> {
    let value = string_field(object, "type")?;
    MessageType::parse(value).ok_or_else(|| ValidationFailure::InvalidMessageType {
        value: value.to_owned(),
    })
}
