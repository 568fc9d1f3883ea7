//! In-memory `GraphStore`, for tests and direct embedding.

use crate::error::EngineResult;
use crate::model::{Node, Relation, RelationType};
use crate::store::traits::GraphStore;
use async_trait::async_trait;
use dashmap::DashMap;

/// Process-local graph store backed by concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// (graph id, node id) -> node
    nodes: DashMap<(String, String), Node>,
    /// graph id -> relations
    relations: DashMap<String, Vec<Relation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a node directly (test setup; bypasses validation).
    pub fn put_node(&self, node: Node) {
        self.nodes
            .insert((node.graph_id.clone(), node.identifier.clone()), node);
    }

    /// Seed a relation directly (test setup; bypasses validation).
    pub fn put_relation(&self, relation: Relation) {
        self.relations
            .entry(relation.graph_id.clone())
            .or_default()
            .push(relation);
    }

    pub fn relation_count(&self, graph_id: &str) -> usize {
        self.relations.get(graph_id).map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn get_node_by_id(&self, graph_id: &str, node_id: &str) -> EngineResult<Option<Node>> {
        Ok(self
            .nodes
            .get(&(graph_id.to_string(), node_id.to_string()))
            .map(|n| n.clone()))
    }

    async fn get_nodes_by_ids(
        &self,
        graph_id: &str,
        node_ids: &[String],
    ) -> EngineResult<Vec<Node>> {
        let mut found = Vec::new();
        for id in node_ids {
            if let Some(node) = self.nodes.get(&(graph_id.to_string(), id.clone())) {
                found.push(node.clone());
            }
        }
        Ok(found)
    }

    async fn outgoing_relations(
        &self,
        graph_id: &str,
        node_id: &str,
        relation_type: RelationType,
    ) -> EngineResult<Vec<Relation>> {
        Ok(self
            .relations
            .get(graph_id)
            .map(|rels| {
                rels.iter()
                    .filter(|r| {
                        r.start_node_id == node_id && r.relation_type() == relation_type
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add_relations(&self, graph_id: &str, relations: &[Relation]) -> EngineResult<()> {
        let mut entry = self.relations.entry(graph_id.to_string()).or_default();
        entry.extend(relations.iter().cloned());
        Ok(())
    }

    async fn delete_relation(&self, graph_id: &str, relation: &Relation) -> EngineResult<bool> {
        let mut removed = false;
        if let Some(mut rels) = self.relations.get_mut(graph_id) {
            let before = rels.len();
            rels.retain(|r| r.identity() != relation.identity());
            removed = rels.len() != before;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;

    fn data_node(id: &str) -> Node {
        Node::new("domain", id, NodeType::DataNode)
    }

    #[tokio::test]
    async fn node_lookup_by_id_and_batch() {
        let store = MemoryStore::new();
        store.put_node(data_node("a"));
        store.put_node(data_node("b"));

        assert!(store.get_node_by_id("domain", "a").await.unwrap().is_some());
        assert!(store.get_node_by_id("domain", "z").await.unwrap().is_none());
        // batch lookup returns only what exists
        let found = store
            .get_nodes_by_ids("domain", &["a".into(), "z".into(), "b".into()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn outgoing_relations_filter_by_type_and_start() {
        let store = MemoryStore::new();
        store.put_relation(Relation::new("domain", "a", RelationType::Constituency, "b"));
        store.put_relation(Relation::new("domain", "a", RelationType::AssociatedTo, "c"));
        store.put_relation(Relation::new("domain", "b", RelationType::Constituency, "c"));

        let out = store
            .outgoing_relations("domain", "a", RelationType::Constituency)
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].end_node_id, "b");
    }

    #[tokio::test]
    async fn delete_relation_matches_identity_triple() {
        let store = MemoryStore::new();
        let rel = Relation::new("domain", "a", RelationType::AssociatedTo, "b");
        store.put_relation(rel.clone());

        assert!(store.delete_relation("domain", &rel).await.unwrap());
        assert!(!store.delete_relation("domain", &rel).await.unwrap());
        assert_eq!(store.relation_count("domain"), 0);
    }
}
