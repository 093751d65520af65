//! Typed payloads for the graph actions.
//!
//! Labels and relationship types end up spliced into Cypher text, so they are
//! restricted to identifiers (`[A-Za-z_][A-Za-z0-9_]*`). Property and
//! parameter values are passed to the store as data and are not inspected.

use mcp_engine::HandlerFailure;
use mcp_protocol::Payload;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::store::{NodeId, Properties};

/// Reasons a payload cannot be turned into a typed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The payload does not match the action's shape.
    #[error("malformed payload: {message}")]
    Malformed {
        /// Decoder diagnostic.
        message: String,
    },

    /// A label or relationship type is not a plain identifier.
    #[error("field '{field}' must be an identifier, found '{value}'")]
    InvalidIdentifier {
        /// Field holding the value.
        field: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The query text is empty or blank.
    #[error("field 'query' must not be empty")]
    EmptyQuery,
}

impl From<RequestError> for HandlerFailure {
    fn from(error: RequestError) -> Self {
        Self::invalid_payload(error.to_string())
    }
}

/// Payload of `create_node`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateNodeRequest {
    /// Labels to attach; may be empty.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Properties to store on the node.
    #[serde(default)]
    pub properties: Properties,
}

/// Payload of `run_cypher_query`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunCypherQueryRequest {
    /// Cypher text.
    pub query: String,
    /// Query parameters.
    #[serde(default)]
    pub parameters: Properties,
}

/// Payload of `create_relationship`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateRelationshipRequest {
    /// Start node.
    pub from_node_id: NodeId,
    /// End node.
    pub to_node_id: NodeId,
    /// Relationship type.
    pub rel_type: String,
    /// Properties to store on the relationship.
    #[serde(default)]
    pub properties: Properties,
}

impl CreateNodeRequest {
    /// Parses and checks a `create_node` payload.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the payload is malformed or a label is not
    /// an identifier.
    pub fn from_payload(payload: &Payload) -> Result<Self, RequestError> {
        let request: Self = decode(payload)?;
        for label in &request.labels {
            require_identifier("labels", label)?;
        }
        Ok(request)
    }
}

impl RunCypherQueryRequest {
    /// Parses and checks a `run_cypher_query` payload.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the payload is malformed or the query is
    /// blank.
    pub fn from_payload(payload: &Payload) -> Result<Self, RequestError> {
        let request: Self = decode(payload)?;
        if request.query.trim().is_empty() {
            return Err(RequestError::EmptyQuery);
        }
        Ok(request)
    }
}

impl CreateRelationshipRequest {
    /// Parses and checks a `create_relationship` payload.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the payload is malformed or the
    /// relationship type is not an identifier.
    pub fn from_payload(payload: &Payload) -> Result<Self, RequestError> {
        let request: Self = decode(payload)?;
        require_identifier("rel_type", &request.rel_type)?;
        Ok(request)
    }
}

/// Returns `true` for names safe to splice into Cypher unquoted.
#[must_use]
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|rest| rest.is_ascii_alphanumeric() || rest == '_')
}

fn require_identifier(field: &'static str, value: &str) -> Result<(), RequestError> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(RequestError::InvalidIdentifier {
            field,
            value: value.to_owned(),
        })
    }
}

fn decode<T: DeserializeOwned>(payload: &Payload) -> Result<T, RequestError> {
    serde_json::from_value(Value::Object(payload.clone())).map_err(|error| {
        RequestError::Malformed {
            message: error.to_string(),
        }
    })
}
