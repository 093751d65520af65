//! Envelope contract for the message control protocol.
//!
//! Every message exchanged with the dispatch engine is an [`Envelope`]: a JSON
//! object carrying an identifier, a creation timestamp, a message type, a
//! `(target, action)` dispatch key, and an opaque payload. Responses also carry
//! `response_to`, the identifier of the request they answer.
//!
//! Inbound values are untrusted. [`Validator::validate`] checks a decoded
//! [`serde_json::Value`] against the envelope schema and either returns a typed
//! [`Envelope`] or a [`ValidationFailure`] naming the field and rule that
//! failed.
//!
//! # Example
//!
//! ```
//! use mcp_protocol::{Envelope, MessageType, Payload, validate};
//! use serde_json::json;
//!
//! let raw = json!({
//!     "id": "2f1b7c2e-8f0a-4a6b-9a51-1f0c3a9d6e11",
//!     "timestamp": "2024-01-01T00:00:00Z",
//!     "type": "request",
//!     "action": "create_node",
//!     "target": "neo4j",
//!     "payload": {"labels": ["Person"]},
//! });
//! let request = validate(&raw).expect("valid envelope");
//! assert_eq!(request.message_type(), MessageType::Request);
//!
//! let response = request.reply(Payload::new());
//! assert_eq!(response.response_to(), Some(request.id()));
//! ```

pub mod envelope;
pub mod error;
pub mod validator;

pub use self::envelope::{Envelope, MessageType, Payload};
pub use self::error::ValidationFailure;
pub use self::validator::{ValidationOptions, Validator, validate};
