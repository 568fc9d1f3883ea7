//! Query-template resolution boundary.
//!
//! Query text lives outside this crate. The client hands a closed operation
//! kind and a parameter map to an injected resolver and runs whatever text
//! comes back.

use indexmap::IndexMap;
use serde_json::Value;

/// Parameter mapping passed to the resolver and the session.
pub type ParamMap = IndexMap<String, Value>;

/// Well-known parameter names.
pub mod params {
    pub const GRAPH_ID: &str = "graphId";
    pub const NODE: &str = "node";
    pub const NODES: &str = "nodes";
    pub const ROOT_NODE: &str = "rootNode";
    pub const NODE_ID: &str = "nodeId";
    pub const PROPERTY: &str = "property";
    pub const PROPERTIES: &str = "properties";
    pub const KEYS: &str = "keys";
    pub const REQUEST: &str = "request";
}

/// Closed set of store operations with externally defined query templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    UpsertNode,
    CreateNode,
    UpdateNode,
    ImportNodes,
    UpdateProperty,
    UpdateProperties,
    RemoveProperty,
    RemoveProperties,
    DeleteNode,
    UpsertRootNode,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpsertNode => "UPSERT_NODE",
            Self::CreateNode => "CREATE_NODE",
            Self::UpdateNode => "UPDATE_NODE",
            Self::ImportNodes => "IMPORT_NODES",
            Self::UpdateProperty => "UPDATE_PROPERTY",
            Self::UpdateProperties => "UPDATE_PROPERTIES",
            Self::RemoveProperty => "REMOVE_PROPERTY",
            Self::RemoveProperties => "REMOVE_PROPERTIES",
            Self::DeleteNode => "DELETE_NODE",
            Self::UpsertRootNode => "UPSERT_ROOTNODE",
        }
    }
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves an operation kind and parameter map to query text.
///
/// Pure function of its inputs; the client assumes no side effects.
pub trait QueryResolver: Send + Sync {
    fn resolve(&self, operation: StoreOperation, params: &ParamMap) -> String;
}

/// Resolver that emits the operation name as the query text. Suitable for
/// tests and for drivers that key execution off the operation themselves.
#[derive(Debug, Default, Clone)]
pub struct PassthroughResolver;

impl QueryResolver for PassthroughResolver {
    fn resolve(&self, operation: StoreOperation, _params: &ParamMap) -> String {
        operation.as_str().to_string()
    }
}
