//! Collections: Set and Sequence nodes whose state is membership relations.
//!
//! A collection node carries no scalar properties of its own, so the
//! property-level operations are rejected as unsupported rather than
//! silently no-opped.

use super::node::{Node, NodeType};
use super::relation::{Relation, RelationType};
use crate::error::{codes, EngineError, EngineResult};
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};

/// The two collection specializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Unordered membership
    Set,
    /// Ordered membership
    Sequence,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Sequence => "SEQUENCE",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "SET" => Some(Self::Set),
            "SEQUENCE" => Some(Self::Sequence),
            _ => None,
        }
    }

    /// The system node type for this collection kind.
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Set => NodeType::Set,
            Self::Sequence => NodeType::Sequence,
        }
    }

    /// The membership relation type expressing this collection's members.
    pub fn membership_type(&self) -> RelationType {
        match self {
            Self::Set => RelationType::SetMembership,
            Self::Sequence => RelationType::SequenceMembership,
        }
    }
}

/// A Set or Sequence node, addressed by id within its graph.
#[derive(Debug, Clone)]
pub struct Collection {
    pub graph_id: String,
    pub id: String,
    kind: CollectionKind,
}

impl Collection {
    pub fn new(graph_id: impl Into<String>, id: impl Into<String>, kind: CollectionKind) -> Self {
        Self {
            graph_id: graph_id.into(),
            id: id.into(),
            kind,
        }
    }

    pub fn set(graph_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(graph_id, id, CollectionKind::Set)
    }

    pub fn sequence(graph_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(graph_id, id, CollectionKind::Sequence)
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn membership_type(&self) -> RelationType {
        self.kind.membership_type()
    }

    /// Materialize as a node. Collections carry no scalar properties.
    pub fn to_node(&self) -> Node {
        Node::new(self.graph_id.clone(), self.id.clone(), self.kind.node_type())
    }

    pub fn get_property(&self, _key: &str) -> EngineResult<serde_json::Value> {
        Err(EngineError::unsupported(
            "getProperty is not supported on collections",
        ))
    }

    pub fn set_property(&self, _key: &str, _value: serde_json::Value) -> EngineResult<()> {
        Err(EngineError::unsupported(
            "setProperty is not supported on collections",
        ))
    }

    pub fn remove_property(&self, _key: &str) -> EngineResult<()> {
        Err(EngineError::unsupported(
            "removeProperty is not supported on collections",
        ))
    }

    pub fn update_metadata(&self, _metadata: &super::node::Metadata) -> EngineResult<()> {
        Err(EngineError::unsupported(
            "updateMetadata is not supported on collections",
        ))
    }

    /// Confirm a member batch is attachable: non-empty, every id resolves,
    /// and every resolved node is a data node. Any mismatch fails the whole
    /// batch.
    pub async fn check_members(
        &self,
        store: &dyn GraphStore,
        member_ids: &[String],
    ) -> EngineResult<()> {
        if member_ids.is_empty() {
            return Err(EngineError::client(
                codes::ERR_COLLECTION_INVALID_MEMBERS,
                "member list is empty",
            ));
        }
        let nodes = store.get_nodes_by_ids(&self.graph_id, member_ids).await?;
        if nodes.len() != member_ids.len() {
            return Err(EngineError::client(
                codes::ERR_COLLECTION_INVALID_MEMBERS,
                format!(
                    "expected {} member nodes, found {}",
                    member_ids.len(),
                    nodes.len()
                ),
            ));
        }
        for node in &nodes {
            if node.node_type() != NodeType::DataNode {
                return Err(EngineError::client(
                    codes::ERR_COLLECTION_INVALID_MEMBERS,
                    format!("member {} is not a data node", node.identifier),
                ));
            }
        }
        Ok(())
    }

    /// Attach a member batch. The whole batch is checked first and written
    /// as one unit; nothing is attached on failure.
    pub async fn add_members(
        &self,
        store: &dyn GraphStore,
        member_ids: &[String],
    ) -> EngineResult<Vec<Relation>> {
        self.check_members(store, member_ids).await?;
        let relations: Vec<Relation> = member_ids
            .iter()
            .map(|member| {
                Relation::new(
                    self.graph_id.clone(),
                    self.id.clone(),
                    self.membership_type(),
                    member.clone(),
                )
            })
            .collect();
        store.add_relations(&self.graph_id, &relations).await?;
        Ok(relations)
    }
}
