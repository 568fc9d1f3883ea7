//! Store boundary traits.
//!
//! `GraphDriver`/`StoreSession` model the external property-graph store's
//! driver: a scoped session per graph id that runs parameterized operations
//! and returns native records. `GraphStore` is the read-and-relation surface
//! that validation and collections consume; the external store and the
//! in-memory test store both implement it.

use crate::error::EngineResult;
use crate::model::{keys, Node, NodeType, Relation, RelationType};
use crate::store::query::ParamMap;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

/// The default top-level node handle in returned records.
pub const DEFAULT_NODE_HANDLE: &str = "ee";

/// A node as the store returns it: a bag of properties.
#[derive(Debug, Clone, Default)]
pub struct NativeNode {
    properties: IndexMap<String, Value>,
}

impl NativeNode {
    pub fn new(properties: IndexMap<String, Value>) -> Self {
        Self { properties }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// One record from a store operation: named node handles plus nothing the
/// middleware needs to interpret further.
#[derive(Debug, Clone, Default)]
pub struct NativeRecord {
    nodes: IndexMap<String, NativeNode>,
}

impl NativeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, handle: impl Into<String>, node: NativeNode) -> Self {
        self.nodes.insert(handle.into(), node);
        self
    }

    pub fn node(&self, handle: &str) -> Option<&NativeNode> {
        self.nodes.get(handle)
    }
}

/// A session scoped to one graph and one logical call.
///
/// Dropped on every exit path; acquire/release nesting is preserved by
/// scope (session is dropped before the driver handle that produced it).
#[async_trait]
pub trait StoreSession: Send {
    /// Run a resolved query with its parameter map.
    async fn run(&mut self, query: &str, params: &ParamMap) -> EngineResult<Vec<NativeRecord>>;
}

/// Driver capable of opening scoped sessions against the store.
#[async_trait]
pub trait GraphDriver: Send + Sync {
    async fn session(&self, graph_id: &str) -> EngineResult<Box<dyn StoreSession>>;
}

/// Read and relation surface over the store, consumed by the validation
/// engine and collections.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Fetch a node by unique id. `Ok(None)` when absent.
    async fn get_node_by_id(&self, graph_id: &str, node_id: &str) -> EngineResult<Option<Node>>;

    /// Fetch a batch of nodes by unique ids; absent ids are simply missing
    /// from the result.
    async fn get_nodes_by_ids(&self, graph_id: &str, node_ids: &[String])
        -> EngineResult<Vec<Node>>;

    /// Outgoing relations of the given type from a node.
    async fn outgoing_relations(
        &self,
        graph_id: &str,
        node_id: &str,
        relation_type: RelationType,
    ) -> EngineResult<Vec<Relation>>;

    /// Write a batch of relations as one atomic unit.
    async fn add_relations(&self, graph_id: &str, relations: &[Relation]) -> EngineResult<()>;

    /// Delete a relation by its identity triple. Returns whether it existed.
    async fn delete_relation(&self, graph_id: &str, relation: &Relation) -> EngineResult<bool>;
}

/// Convenience: a native node carrying the reserved keys for a domain node.
/// Used by drivers and tests when materializing store results.
pub fn native_from_node(node: &Node) -> NativeNode {
    let mut props = node.metadata.clone();
    props.insert(
        keys::IL_UNIQUE_ID.to_string(),
        Value::String(node.identifier.clone()),
    );
    props.insert(
        keys::IL_SYS_NODE_TYPE.to_string(),
        Value::String(node.node_type().as_str().to_string()),
    );
    NativeNode::new(props)
}

/// Rebuild a domain node from store properties, when the reserved keys are
/// present and well formed.
pub fn node_from_native(graph_id: &str, native: &NativeNode) -> Option<Node> {
    let id = native.property(keys::IL_UNIQUE_ID)?.as_str()?;
    let node_type = NodeType::parse(native.property(keys::IL_SYS_NODE_TYPE)?.as_str()?)?;
    let mut node = Node::new(graph_id, id, node_type);
    if let Some(ot) = native
        .property(keys::IL_FUNC_OBJECT_TYPE)
        .and_then(Value::as_str)
    {
        node.object_type = Some(ot.to_string());
    }
    Some(node)
}
