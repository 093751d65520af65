//! Graph-store handlers for the `neo4j` dispatch target.
//!
//! The dispatch engine knows nothing about graphs; this crate adapts a
//! [`GraphStore`] into four [`Handler`](mcp_engine::Handler)s and registers
//! them under the `neo4j` target:
//!
//! | action | payload |
//! |---|---|
//! | `create_node` | `{labels: [string], properties: object}` |
//! | `run_cypher_query` | `{query: string, parameters: object}` |
//! | `create_relationship` | `{from_node_id, to_node_id, rel_type, properties}` |
//! | `health` | ignored; answers `{status, neo4j}` from [`GraphStore::ping`] |
//!
//! Payloads are parsed into typed requests before the store is touched, so a
//! malformed payload fails with `invalid_payload` and never reaches the
//! backend. Labels and relationship types must be plain identifiers.
//!
//! [`InMemoryGraphStore`] is a self-contained backend suitable for tests and
//! for running the daemon without a database.

mod handlers;
mod memory;
mod request;
mod store;

pub use handlers::{
    CREATE_NODE_ACTION, CREATE_RELATIONSHIP_ACTION, CreateNodeHandler, CreateRelationshipHandler,
    GRAPH_TARGET, HEALTH_ACTION, HealthHandler, RUN_CYPHER_QUERY_ACTION, RunCypherQueryHandler,
    register_graph_handlers,
};
pub use memory::InMemoryGraphStore;
pub use request::{
    CreateNodeRequest, CreateRelationshipRequest, RequestError, RunCypherQueryRequest,
    is_identifier,
};
pub use store::{GraphStore, NodeId, NodeRecord, Properties, RelationshipRecord, StoreError};
