//! Dispatch engine for the message control protocol.
//!
//! The engine accepts decoded JSON values, validates them as
//! [`Envelope`](mcp_protocol::Envelope)s, routes requests by their
//! `(target, action)` key to a [`Handler`] held in a [`HandlerRegistry`], and
//! answers every input with exactly one response envelope. Malformed input,
//! unknown routes, and handler failures become error responses whose payload
//! carries an `error` marker and a human-readable `message`; nothing panics or
//! escapes [`DispatchEngine::process`].
//!
//! The registry is built once at startup and moved into the engine, after
//! which it is read-only. Each handler call runs on a worker thread bounded by
//! an optional deadline, so concurrent callers never wait on one another. A
//! handler cannot be cancelled, so workers that outlive their deadline keep
//! running; the engine caps live workers and fails further calls fast.
//!
//! # Example
//!
//! ```
//! use mcp_engine::{DispatchEngine, HandlerFailure, HandlerRegistry};
//! use mcp_protocol::{Envelope, Payload};
//!
//! let mut registry = HandlerRegistry::new();
//! registry
//!     .register("neo4j", "create_node", |_payload: &Payload| {
//!         let mut result = Payload::new();
//!         result.insert("status".into(), "success".into());
//!         Ok::<_, HandlerFailure>(result)
//!     })
//!     .expect("first registration succeeds");
//!
//! let engine = DispatchEngine::new(registry);
//! let request = Envelope::request("create_node", "neo4j", Payload::new(), None);
//! let response = engine.process(&request.to_value().expect("request encodes"));
//! assert_eq!(response.response_to(), Some(request.id()));
//! ```

pub mod engine;
pub mod error;
pub mod handler;
pub mod registry;

pub use self::engine::{
    DEFAULT_HANDLER_TIMEOUT, DEFAULT_MAX_WORKERS, DispatchEngine, EngineOptions, FALLBACK_ACTION,
    FALLBACK_TARGET,
};
pub use self::error::{DispatchError, RegistryError};
pub use self::handler::{FailureKind, Handler, HandlerFailure};
pub use self::registry::{DispatchKey, HandlerRegistry};
