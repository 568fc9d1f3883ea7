//! Asynchronous multi-check validation of relations and collections.
//!
//! Each structural rule is an independent async check producing a
//! (node id, messages) pair. Checks for one relation are launched together
//! and joined wait-for-all; the aggregate is a union, so completion order
//! never matters. Violations are always data in the resulting `MessageMap`;
//! an `Err` from the engine means infrastructure failure, not a failed rule.

mod schema;

pub use schema::{PermissiveSchema, RuleSetSchema, SchemaRegistry};

use crate::error::{codes, EngineError, EngineResult};
use crate::model::{Collection, NodeType, Relation, ValidationProfile};
use crate::store::GraphStore;
use futures::future::{join_all, BoxFuture};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Node id -> violation messages. An empty list means no violations for
/// that node; overall validity is the union of all lists being empty.
pub type MessageMap = IndexMap<String, Vec<String>>;

/// Whether a message map reports any violation.
pub fn is_valid(map: &MessageMap) -> bool {
    map.values().all(|msgs| msgs.is_empty())
}

type CheckOutcome = EngineResult<(String, Vec<String>)>;

/// Orchestrates per-relation and per-collection validation.
pub struct ValidationEngine {
    store: Arc<dyn GraphStore>,
    schema: Arc<dyn SchemaRegistry>,
}

impl ValidationEngine {
    pub fn new(store: Arc<dyn GraphStore>, schema: Arc<dyn SchemaRegistry>) -> Self {
        Self { store, schema }
    }

    /// Run all checks the relation's type requires, concurrently, and merge
    /// the outcomes. Infrastructure failures surface as a single
    /// server-side validation failure.
    pub async fn validate_relation(&self, relation: &Relation) -> EngineResult<MessageMap> {
        let mut checks: Vec<BoxFuture<'_, CheckOutcome>> = Vec::new();
        match relation.relation_type().validation_profile() {
            ValidationProfile::Full => {
                checks.push(Box::pin(self.check_cycle(relation)));
                checks.push(Box::pin(
                    self.check_endpoint_type(&relation.graph_id, &relation.start_node_id),
                ));
                checks.push(Box::pin(
                    self.check_endpoint_type(&relation.graph_id, &relation.end_node_id),
                ));
                checks.push(Box::pin(self.check_schema(relation)));
            }
            ValidationProfile::SchemaOnly => {
                checks.push(Box::pin(self.check_schema(relation)));
            }
            ValidationProfile::MemberType => {
                checks.push(Box::pin(
                    self.check_endpoint_type(&relation.graph_id, &relation.end_node_id),
                ));
            }
            ValidationProfile::None => {}
        }
        debug!(
            relation_type = %relation.relation_type(),
            checks = checks.len(),
            "launching validation checks"
        );

        let mut map = MessageMap::new();
        for outcome in join_all(checks).await {
            let (node_id, messages) = outcome.map_err(|e| {
                EngineError::server(
                    codes::ERR_RELATION_VALIDATE,
                    format!("relation validation failed: {}", e.message()),
                )
            })?;
            map.entry(node_id).or_default().extend(messages);
        }
        Ok(map)
    }

    /// Validate a collection node: its id maps to an empty message list
    /// when nothing is wrong, matching the relation validation shape.
    pub async fn validate_collection(&self, collection: &Collection) -> EngineResult<MessageMap> {
        let mut messages = Vec::new();
        let existing = self
            .store
            .get_node_by_id(&collection.graph_id, &collection.id)
            .await
            .map_err(|e| {
                EngineError::server(
                    codes::ERR_RELATION_VALIDATE,
                    format!("collection validation failed: {}", e.message()),
                )
            })?;
        // A not-yet-persisted collection is fine; an existing node of a
        // different kind is not.
        if let Some(node) = existing {
            let expected = collection.kind().node_type();
            if node.node_type() != expected {
                messages.push(format!(
                    "node {} is not a {}",
                    collection.id,
                    expected.as_str()
                ));
            }
        }
        let mut map = MessageMap::new();
        map.insert(collection.id.clone(), messages);
        Ok(map)
    }

    /// Walk existing constituency edges forward from the proposed end node;
    /// reaching the proposed start node means the new edge closes a cycle.
    async fn check_cycle(&self, relation: &Relation) -> CheckOutcome {
        let start = relation.start_node_id.clone();
        let mut messages = Vec::new();

        if relation.start_node_id == relation.end_node_id {
            messages.push(format!(
                "relation {} from {} to itself creates a cycle",
                relation.relation_type(),
                start
            ));
            return Ok((start, messages));
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![relation.end_node_id.clone()];
        while let Some(current) = frontier.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let outgoing = self
                .store
                .outgoing_relations(&relation.graph_id, &current, relation.relation_type())
                .await?;
            for edge in outgoing {
                if edge.end_node_id == relation.start_node_id {
                    messages.push(format!(
                        "relation {} from {} to {} creates a cycle",
                        relation.relation_type(),
                        relation.start_node_id,
                        relation.end_node_id
                    ));
                    return Ok((start, messages));
                }
                frontier.push(edge.end_node_id);
            }
        }
        Ok((start, messages))
    }

    /// The endpoint must exist and be a data node; violations are scoped to
    /// the endpoint's id.
    async fn check_endpoint_type(&self, graph_id: &str, node_id: &str) -> CheckOutcome {
        let mut messages = Vec::new();
        match self.store.get_node_by_id(graph_id, node_id).await? {
            None => messages.push(format!("node {} not found", node_id)),
            Some(node) if node.node_type() != NodeType::DataNode => messages.push(format!(
                "node {} is not a {}",
                node_id,
                NodeType::DataNode.as_str()
            )),
            Some(_) => {}
        }
        Ok((node_id.to_string(), messages))
    }

    /// The relation must be permitted between the endpoints' object types.
    /// Missing endpoints are reported by the endpoint-type check, not here.
    async fn check_schema(&self, relation: &Relation) -> CheckOutcome {
        let start_id = relation.start_node_id.clone();
        let start = self
            .store
            .get_node_by_id(&relation.graph_id, &relation.start_node_id)
            .await?;
        let end = self
            .store
            .get_node_by_id(&relation.graph_id, &relation.end_node_id)
            .await?;
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (s, e),
            _ => return Ok((start_id, Vec::new())),
        };

        let mut messages = Vec::new();
        if !self.schema.is_relation_allowed(
            start.object_type.as_deref(),
            relation.relation_type(),
            end.object_type.as_deref(),
        ) {
            messages.push(format!(
                "relation {} is not allowed between {} and {}",
                relation.relation_type(),
                start.object_type.as_deref().unwrap_or("<none>"),
                end.object_type.as_deref().unwrap_or("<none>"),
            ));
        }
        Ok((start_id, messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, RelationType};
    use crate::store::MemoryStore;

    fn engine_with(store: MemoryStore, schema: impl SchemaRegistry + 'static) -> ValidationEngine {
        ValidationEngine::new(Arc::new(store), Arc::new(schema))
    }

    fn data_node(id: &str, object_type: &str) -> Node {
        Node::new("domain", id, NodeType::DataNode).with_object_type(object_type)
    }

    fn constituency(start: &str, end: &str) -> Relation {
        Relation::new("domain", start, RelationType::Constituency, end)
    }

    #[tokio::test]
    async fn clean_constituency_relation_has_no_violations() {
        let store = MemoryStore::new();
        store.put_node(data_node("a", "Content"));
        store.put_node(data_node("b", "Asset"));
        let engine = engine_with(store, PermissiveSchema);

        let map = engine.validate_relation(&constituency("a", "b")).await.unwrap();
        assert!(is_valid(&map));
        // every touched node is represented, with an empty list
        assert!(map.contains_key("a"));
        assert!(map.contains_key("b"));
    }

    #[tokio::test]
    async fn cycle_through_constituency_edges_is_rejected() {
        // Existing edges a -> b -> c; proposing c -> a closes the cycle.
        let store = MemoryStore::new();
        for id in ["a", "b", "c"] {
            store.put_node(data_node(id, "Content"));
        }
        store.put_relation(constituency("a", "b"));
        store.put_relation(constituency("b", "c"));
        let engine = engine_with(store, PermissiveSchema);

        let map = engine.validate_relation(&constituency("c", "a")).await.unwrap();
        assert!(!is_valid(&map));
        let msgs = &map["c"];
        assert!(msgs.iter().any(|m| m.contains("cycle")), "{:?}", msgs);
    }

    #[tokio::test]
    async fn self_loop_is_a_cycle() {
        let store = MemoryStore::new();
        store.put_node(data_node("a", "Content"));
        let engine = engine_with(store, PermissiveSchema);

        let map = engine.validate_relation(&constituency("a", "a")).await.unwrap();
        assert!(map["a"].iter().any(|m| m.contains("cycle")));
    }

    #[tokio::test]
    async fn non_data_node_endpoint_is_reported_under_its_own_id() {
        let store = MemoryStore::new();
        store.put_node(data_node("a", "Content"));
        store.put_node(Node::new("domain", "root", NodeType::RootNode));
        let engine = engine_with(store, PermissiveSchema);

        let map = engine
            .validate_relation(&constituency("a", "root"))
            .await
            .unwrap();
        assert!(map["root"].iter().any(|m| m.contains("not a DATA_NODE")));
        assert!(map["a"].is_empty());
    }

    #[tokio::test]
    async fn missing_endpoint_is_reported() {
        let store = MemoryStore::new();
        store.put_node(data_node("a", "Content"));
        let engine = engine_with(store, PermissiveSchema);

        let map = engine
            .validate_relation(&constituency("a", "ghost"))
            .await
            .unwrap();
        assert!(map["ghost"].iter().any(|m| m.contains("not found")));
    }

    #[tokio::test]
    async fn schema_incompatibility_is_reported() {
        let store = MemoryStore::new();
        store.put_node(data_node("a", "Asset"));
        store.put_node(data_node("b", "Content"));
        // only Content -> Asset is permitted
        let schema = RuleSetSchema::new().permit(RelationType::Constituency, "Content", "Asset");
        let engine = engine_with(store, schema);

        let map = engine.validate_relation(&constituency("a", "b")).await.unwrap();
        assert!(map["a"].iter().any(|m| m.contains("not allowed")));
    }

    #[tokio::test]
    async fn membership_relation_checks_member_type_only() {
        let store = MemoryStore::new();
        store.put_node(Node::new("domain", "set_1", NodeType::Set));
        store.put_node(Node::new("domain", "tag1", NodeType::Tag));
        let engine = engine_with(store, PermissiveSchema);

        let rel = Relation::new("domain", "set_1", RelationType::SetMembership, "tag1");
        let map = engine.validate_relation(&rel).await.unwrap();
        assert!(map["tag1"].iter().any(|m| m.contains("not a DATA_NODE")));
        // the set itself is not an endpoint being checked
        assert!(!map.contains_key("set_1"));
    }

    #[tokio::test]
    async fn unconstrained_types_validate_trivially() {
        let store = MemoryStore::new();
        let engine = engine_with(store, PermissiveSchema);
        let rel = Relation::new("domain", "x", RelationType::Hierarchy, "y");
        let map = engine.validate_relation(&rel).await.unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn collection_validation_keys_by_its_own_id() {
        let store = MemoryStore::new();
        store.put_node(Node::new("domain", "set_1", NodeType::Set));
        let engine = engine_with(store, PermissiveSchema);

        let map = engine
            .validate_collection(&Collection::set("domain", "set_1"))
            .await
            .unwrap();
        assert_eq!(map.len(), 1);
        assert!(map["set_1"].is_empty());
    }

    #[tokio::test]
    async fn collection_id_bound_to_wrong_node_kind_is_a_violation() {
        let store = MemoryStore::new();
        store.put_node(Node::new("domain", "set_1", NodeType::DataNode));
        let engine = engine_with(store, PermissiveSchema);

        let map = engine
            .validate_collection(&Collection::set("domain", "set_1"))
            .await
            .unwrap();
        assert!(!map["set_1"].is_empty());
    }
}
