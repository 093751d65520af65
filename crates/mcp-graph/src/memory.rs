//! Process-local graph store.
//!
//! Nodes and relationships live in memory behind a mutex and receive
//! monotonically increasing identifiers starting at zero. The store does not
//! evaluate Cypher: [`run_query`](GraphStore::run_query) accepts any query and
//! returns no rows.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::store::{GraphStore, NodeId, NodeRecord, Properties, RelationshipRecord, StoreError};

const MEMORY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::memory");

#[derive(Debug, Default)]
struct MemoryState {
    next_node_id: NodeId,
    next_relationship_id: NodeId,
    nodes: BTreeMap<NodeId, NodeRecord>,
    relationships: BTreeMap<NodeId, RelationshipRecord>,
}

/// In-memory [`GraphStore`].
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    state: Mutex<MemoryState>,
}

impl InMemoryGraphStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the node with `id`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the state lock is poisoned.
    pub fn node(&self, id: NodeId) -> Result<Option<NodeRecord>, StoreError> {
        Ok(self.lock()?.nodes.get(&id).cloned())
    }

    /// Returns a copy of the relationship with `id`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the state lock is poisoned.
    pub fn relationship(&self, id: NodeId) -> Result<Option<RelationshipRecord>, StoreError> {
        Ok(self.lock()?.relationships.get(&id).cloned())
    }

    /// Number of stored nodes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the state lock is poisoned.
    pub fn node_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.nodes.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::unavailable("in-memory graph state lock poisoned"))
    }
}

impl GraphStore for InMemoryGraphStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(drop)
    }

    fn create_node(
        &self,
        labels: &[String],
        properties: &Properties,
    ) -> Result<NodeRecord, StoreError> {
        let mut state = self.lock()?;
        let id = state.next_node_id;
        state.next_node_id += 1;
        let record = NodeRecord {
            id,
            labels: labels.to_vec(),
            properties: properties.clone(),
        };
        state.nodes.insert(id, record.clone());
        debug!(target: MEMORY_TARGET, id, "created node");
        Ok(record)
    }

    fn run_query(
        &self,
        query: &str,
        _parameters: &Properties,
    ) -> Result<Vec<Properties>, StoreError> {
        debug!(target: MEMORY_TARGET, query, "query accepted without evaluation");
        Ok(Vec::new())
    }

    fn create_relationship(
        &self,
        from: NodeId,
        to: NodeId,
        rel_type: &str,
        properties: &Properties,
    ) -> Result<RelationshipRecord, StoreError> {
        let mut state = self.lock()?;
        for endpoint in [from, to] {
            if !state.nodes.contains_key(&endpoint) {
                return Err(StoreError::NodeNotFound { id: endpoint });
            }
        }
        let id = state.next_relationship_id;
        state.next_relationship_id += 1;
        let record = RelationshipRecord {
            id,
            rel_type: rel_type.to_owned(),
            start: from,
            end: to,
            properties: properties.clone(),
        };
        state.relationships.insert(id, record.clone());
        debug!(target: MEMORY_TARGET, id, from, to, rel_type, "created relationship");
        Ok(record)
    }
}
