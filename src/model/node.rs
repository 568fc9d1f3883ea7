//! Node representation: a vertex in the property graph.

use super::keys;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered metadata mapping carried by nodes and relations.
pub type Metadata = IndexMap<String, Value>;

/// Closed system taxonomy of node kinds.
///
/// `DataNode` marks genuine domain entities; everything else is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    DataNode,
    RootNode,
    ShadowNode,
    Set,
    Sequence,
    DefinitionNode,
    Tag,
}

impl NodeType {
    /// Wire name, verbatim as persisted in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataNode => "DATA_NODE",
            Self::RootNode => "ROOT_NODE",
            Self::ShadowNode => "SHADOW_NODE",
            Self::Set => "SET",
            Self::Sequence => "SEQUENCE",
            Self::DefinitionNode => "DEFINITION_NODE",
            Self::Tag => "TAG",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "DATA_NODE" => Some(Self::DataNode),
            "ROOT_NODE" => Some(Self::RootNode),
            "SHADOW_NODE" => Some(Self::ShadowNode),
            "SET" => Some(Self::Set),
            "SEQUENCE" => Some(Self::Sequence),
            "DEFINITION_NODE" => Some(Self::DefinitionNode),
            "TAG" => Some(Self::Tag),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex in the property graph.
///
/// Transient, request-scoped materialization of store data; all persistent
/// state lives in the external store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the graph
    pub identifier: String,
    /// Owning graph
    pub graph_id: String,
    /// System node kind; immutable after construction
    node_type: NodeType,
    /// Domain-defined schema name; None for system nodes
    pub object_type: Option<String>,
    /// Ordered property map; reserved keys live here once persisted
    pub metadata: Metadata,
}

impl Node {
    pub fn new(
        graph_id: impl Into<String>,
        identifier: impl Into<String>,
        node_type: NodeType,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            graph_id: graph_id.into(),
            node_type,
            object_type: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The system node kind. No setter: the kind is fixed at construction.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Write the reserved identity keys into the metadata.
    pub fn stamp_system_metadata(&mut self) {
        self.metadata.insert(
            keys::IL_UNIQUE_ID.to_string(),
            Value::String(self.identifier.clone()),
        );
        self.metadata.insert(
            keys::IL_SYS_NODE_TYPE.to_string(),
            Value::String(self.node_type.as_str().to_string()),
        );
        if let Some(ot) = &self.object_type {
            self.metadata.insert(
                keys::IL_FUNC_OBJECT_TYPE.to_string(),
                Value::String(ot.clone()),
            );
        }
    }

    /// The store-assigned version token, once persisted.
    pub fn version_key(&self) -> Option<&str> {
        self.metadata.get(keys::VERSION_KEY).and_then(Value::as_str)
    }
}
