//! Backend abstraction for graph operations.

use mcp_engine::{FailureKind, HandlerFailure};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Property map stored on nodes and relationships.
pub type Properties = serde_json::Map<String, Value>;

/// Store-assigned identifier of a node or relationship.
pub type NodeId = i64;

/// A node as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    /// Store-assigned identifier.
    pub id: NodeId,
    /// Labels attached to the node.
    pub labels: Vec<String>,
    /// Properties stored on the node.
    pub properties: Properties,
}

/// A relationship as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipRecord {
    /// Store-assigned identifier.
    pub id: NodeId,
    /// Relationship type.
    pub rel_type: String,
    /// Identifier of the start node.
    pub start: NodeId,
    /// Identifier of the end node.
    pub end: NodeId,
    /// Properties stored on the relationship.
    pub properties: Properties,
}

/// Errors reported by a [`GraphStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A referenced node does not exist.
    #[error("node {id} does not exist")]
    NodeNotFound {
        /// Identifier that failed to resolve.
        id: NodeId,
    },

    /// The backend could not be reached.
    #[error("graph store unavailable: {message}")]
    Unavailable {
        /// Description of the connectivity failure.
        message: String,
    },

    /// The backend rejected or failed the operation.
    #[error("graph query failed: {message}")]
    Query {
        /// Backend diagnostic.
        message: String,
    },
}

impl StoreError {
    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a `Query` error.
    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Handler failure category for this error.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::NodeNotFound { .. } => FailureKind::NotFound,
            Self::Unavailable { .. } => FailureKind::Unavailable,
            Self::Query { .. } => FailureKind::QueryFailed,
        }
    }
}

impl From<StoreError> for HandlerFailure {
    fn from(error: StoreError) -> Self {
        Self::new(error.failure_kind(), error.to_string())
    }
}

/// Graph database operations backing the `neo4j` handlers.
///
/// Implementations are shared between concurrently running handlers and must
/// synchronise internally.
pub trait GraphStore: Send + Sync {
    /// Checks that the backend is reachable, as a trivial `RETURN 1` would.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend cannot be reached.
    fn ping(&self) -> Result<(), StoreError>;

    /// Creates a node with the given labels and properties.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn create_node(
        &self,
        labels: &[String],
        properties: &Properties,
    ) -> Result<NodeRecord, StoreError>;

    /// Runs a Cypher query and returns one map per result row.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend rejects or fails the query.
    fn run_query(&self, query: &str, parameters: &Properties)
    -> Result<Vec<Properties>, StoreError>;

    /// Creates a relationship of type `rel_type` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NodeNotFound`] if either endpoint is missing, or
    /// another [`StoreError`] if the backend fails.
    fn create_relationship(
        &self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: &Properties,
    ) -> Result<RelationshipRecord, StoreError>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::missing(StoreError::NodeNotFound { id: 7 }, FailureKind::NotFound)]
    #[case::offline(StoreError::unavailable("connection refused"), FailureKind::Unavailable)]
    #[case::syntax(StoreError::query("syntax error"), FailureKind::QueryFailed)]
    fn store_errors_map_to_failure_kinds(#[case] error: StoreError, #[case] kind: FailureKind) {
        let message = error.to_string();
        let failure = HandlerFailure::from(error);
        assert_eq!(failure.kind(), kind);
        assert_eq!(failure.message(), message);
    }
}
