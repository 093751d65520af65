//! Handlers adapting a [`GraphStore`] to the dispatch engine.

use std::sync::Arc;

use mcp_engine::{Handler, HandlerFailure, HandlerRegistry, RegistryError};
use mcp_protocol::Payload;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::request::{CreateNodeRequest, CreateRelationshipRequest, RunCypherQueryRequest};
use crate::store::{GraphStore, NodeId, Properties};

const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handlers");

/// Dispatch target under which the graph handlers are registered.
pub const GRAPH_TARGET: &str = "neo4j";
/// Action creating a node.
pub const CREATE_NODE_ACTION: &str = "create_node";
/// Action running a Cypher query.
pub const RUN_CYPHER_QUERY_ACTION: &str = "run_cypher_query";
/// Action creating a relationship.
pub const CREATE_RELATIONSHIP_ACTION: &str = "create_relationship";
/// Action reporting whether the store is reachable.
pub const HEALTH_ACTION: &str = "health";

const SUCCESS: &str = "success";

#[derive(Serialize)]
struct NodeCreated<'a> {
    status: &'static str,
    node_id: NodeId,
    labels: &'a [String],
    properties: &'a Properties,
}

#[derive(Serialize)]
struct QueryCompleted<'a> {
    status: &'static str,
    results: &'a [Properties],
    count: usize,
}

#[derive(Serialize)]
struct RelationshipCreated<'a> {
    status: &'static str,
    relationship_id: NodeId,
    #[serde(rename = "type")]
    rel_type: &'a str,
    properties: &'a Properties,
}

#[derive(Serialize)]
struct StoreHealth {
    status: &'static str,
    neo4j: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Handles `neo4j/create_node`.
#[derive(Clone)]
pub struct CreateNodeHandler {
    store: Arc<dyn GraphStore>,
}

impl CreateNodeHandler {
    /// Creates a handler over `store`.
    #[must_use]
    pub const fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }
}

impl Handler for CreateNodeHandler {
    fn handle(&self, payload: &Payload) -> Result<Payload, HandlerFailure> {
        let request = CreateNodeRequest::from_payload(payload)?;
        let node = self.store.create_node(&request.labels, &request.properties)?;
        debug!(target: HANDLER_TARGET, node_id = node.id, "node created");
        into_payload(&NodeCreated {
            status: SUCCESS,
            node_id: node.id,
            labels: &node.labels,
            properties: &node.properties,
        })
    }
}

/// Handles `neo4j/run_cypher_query`.
#[derive(Clone)]
pub struct RunCypherQueryHandler {
    store: Arc<dyn GraphStore>,
}

impl RunCypherQueryHandler {
    /// Creates a handler over `store`.
    #[must_use]
    pub const fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }
}

impl Handler for RunCypherQueryHandler {
    fn handle(&self, payload: &Payload) -> Result<Payload, HandlerFailure> {
        let request = RunCypherQueryRequest::from_payload(payload)?;
        let rows = self.store.run_query(&request.query, &request.parameters)?;
        debug!(target: HANDLER_TARGET, count = rows.len(), "query completed");
        into_payload(&QueryCompleted {
            status: SUCCESS,
            results: &rows,
            count: rows.len(),
        })
    }
}

/// Handles `neo4j/create_relationship`.
#[derive(Clone)]
pub struct CreateRelationshipHandler {
    store: Arc<dyn GraphStore>,
}

impl CreateRelationshipHandler {
    /// Creates a handler over `store`.
    #[must_use]
    pub const fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }
}

impl Handler for CreateRelationshipHandler {
    fn handle(&self, payload: &Payload) -> Result<Payload, HandlerFailure> {
        let request = CreateRelationshipRequest::from_payload(payload)?;
        let relationship = self.store.create_relationship(
            request.from_node_id,
            request.to_node_id,
            &request.rel_type,
            &request.properties,
        )?;
        debug!(
            target: HANDLER_TARGET,
            relationship_id = relationship.id,
            "relationship created"
        );
        into_payload(&RelationshipCreated {
            status: SUCCESS,
            relationship_id: relationship.id,
            rel_type: &relationship.rel_type,
            properties: &relationship.properties,
        })
    }
}

/// Handles `neo4j/health`.
///
/// Always answers: an unreachable store is reported as `degraded` rather than
/// as a handler failure.
#[derive(Clone)]
pub struct HealthHandler {
    store: Arc<dyn GraphStore>,
}

impl HealthHandler {
    /// Creates a handler over `store`.
    #[must_use]
    pub const fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }
}

impl Handler for HealthHandler {
    fn handle(&self, _payload: &Payload) -> Result<Payload, HandlerFailure> {
        let health = match self.store.ping() {
            Ok(()) => StoreHealth {
                status: "healthy",
                neo4j: "connected",
                message: None,
            },
            Err(error) => {
                warn!(target: HANDLER_TARGET, %error, "graph store unreachable");
                StoreHealth {
                    status: "degraded",
                    neo4j: "disconnected",
                    message: Some(error.to_string()),
                }
            }
        };
        into_payload(&health)
    }
}

/// Registers the graph handlers under [`GRAPH_TARGET`].
///
/// # Errors
///
/// Returns [`RegistryError::Conflict`] if any of the keys is already taken.
pub fn register_graph_handlers(
    registry: &mut HandlerRegistry,
    store: &Arc<dyn GraphStore>,
) -> Result<(), RegistryError> {
    registry.register(
        GRAPH_TARGET,
        CREATE_NODE_ACTION,
        CreateNodeHandler::new(Arc::clone(store)),
    )?;
    registry.register(
        GRAPH_TARGET,
        RUN_CYPHER_QUERY_ACTION,
        RunCypherQueryHandler::new(Arc::clone(store)),
    )?;
    registry.register(
        GRAPH_TARGET,
        CREATE_RELATIONSHIP_ACTION,
        CreateRelationshipHandler::new(Arc::clone(store)),
    )?;
    registry.register(
        GRAPH_TARGET,
        HEALTH_ACTION,
        HealthHandler::new(Arc::clone(store)),
    )
}

fn into_payload<T: Serialize>(result: &T) -> Result<Payload, HandlerFailure> {
    match serde_json::to_value(result) {
        Ok(Value::Object(payload)) => Ok(payload),
        Ok(other) => Err(HandlerFailure::internal(format!(
            "handler result serialised to a non-object: {other}"
        ))),
        Err(error) => Err(HandlerFailure::internal(format!(
            "failed to serialise handler result: {error}"
        ))),
    }
}
