//! Graph store client: one call per logical store operation.
//!
//! Every call validates its inputs before touching the driver, holds a
//! session strictly scoped to the call, and reconciles store-assigned
//! version metadata back into the domain node. Version-token extraction is
//! best-effort: the primary write has already succeeded by the time it
//! runs, so a missing token is logged and swallowed.

use crate::envelope::Request;
use crate::error::{codes, EngineError, EngineResult};
use crate::model::{keys, Metadata, Node, NodeType};
use crate::store::query::{params, ParamMap, QueryResolver, StoreOperation};
use crate::store::traits::{GraphDriver, NativeRecord, DEFAULT_NODE_HANDLE};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Client over the external property-graph store.
pub struct StoreClient {
    driver: Arc<dyn GraphDriver>,
    resolver: Arc<dyn QueryResolver>,
}

impl StoreClient {
    pub fn new(driver: Arc<dyn GraphDriver>, resolver: Arc<dyn QueryResolver>) -> Self {
        Self { driver, resolver }
    }

    /// Insert-or-update a node. Merges the store-assigned version token
    /// back into the node's metadata.
    pub async fn upsert_node(
        &self,
        graph_id: &str,
        node: &mut Node,
        request: &Request,
    ) -> EngineResult<()> {
        self.write_node(StoreOperation::UpsertNode, graph_id, node, request)
            .await
    }

    /// Create a node.
    pub async fn create_node(
        &self,
        graph_id: &str,
        node: &mut Node,
        request: &Request,
    ) -> EngineResult<()> {
        self.write_node(StoreOperation::CreateNode, graph_id, node, request)
            .await
    }

    /// Update an existing node.
    pub async fn update_node(
        &self,
        graph_id: &str,
        node: &mut Node,
        request: &Request,
    ) -> EngineResult<()> {
        self.write_node(StoreOperation::UpdateNode, graph_id, node, request)
            .await
    }

    /// Bulk-import nodes. Version tokens are merged back per node, matched
    /// on the reserved unique-id key of each returned record.
    pub async fn import_nodes(
        &self,
        graph_id: &str,
        nodes: &mut [Node],
        request: &Request,
    ) -> EngineResult<()> {
        require_graph_id(graph_id, "Import Nodes")?;
        if nodes.is_empty() {
            return Err(EngineError::client(
                codes::ERR_GRAPH_INVALID_NODE,
                "Invalid node list | [Import Nodes Operation Failed.]",
            ));
        }

        let mut map = base_params(graph_id, request)?;
        map.insert(params::NODES.to_string(), to_param(&nodes)?);
        let records = self.run(StoreOperation::ImportNodes, graph_id, &map).await?;

        for node in nodes.iter_mut() {
            let matching = records.iter().find(|r| {
                r.node(DEFAULT_NODE_HANDLE)
                    .and_then(|n| n.property(keys::IL_UNIQUE_ID))
                    .and_then(Value::as_str)
                    == Some(node.identifier.as_str())
            });
            if let Some(record) = matching {
                merge_version_key(record, node);
            }
        }
        Ok(())
    }

    /// Update a single scalar property on a node.
    pub async fn update_property(
        &self,
        graph_id: &str,
        node_id: &str,
        key: &str,
        value: Value,
        request: &Request,
    ) -> EngineResult<()> {
        require_graph_id(graph_id, "Update Property")?;
        require_node_id(node_id, "Update Property")?;
        require_key(key, "Update Property")?;

        let mut map = base_params(graph_id, request)?;
        map.insert(params::NODE_ID.to_string(), Value::String(node_id.into()));
        map.insert(
            params::PROPERTY.to_string(),
            serde_json::json!({ "key": key, "value": value }),
        );
        self.run(StoreOperation::UpdateProperty, graph_id, &map)
            .await?;
        Ok(())
    }

    /// Update a batch of properties on a node.
    pub async fn update_properties(
        &self,
        graph_id: &str,
        node_id: &str,
        properties: &Metadata,
        request: &Request,
    ) -> EngineResult<()> {
        require_graph_id(graph_id, "Update Properties")?;
        require_node_id(node_id, "Update Properties")?;
        if properties.is_empty() {
            return Err(EngineError::client(
                codes::ERR_GRAPH_INVALID_PROPERTY,
                "Invalid properties | [Update Properties Operation Failed.]",
            ));
        }

        let mut map = base_params(graph_id, request)?;
        map.insert(params::NODE_ID.to_string(), Value::String(node_id.into()));
        map.insert(params::PROPERTIES.to_string(), to_param(properties)?);
        self.run(StoreOperation::UpdateProperties, graph_id, &map)
            .await?;
        Ok(())
    }

    /// Remove a single property from a node.
    pub async fn remove_property(
        &self,
        graph_id: &str,
        node_id: &str,
        key: &str,
        request: &Request,
    ) -> EngineResult<()> {
        require_graph_id(graph_id, "Remove Property")?;
        require_node_id(node_id, "Remove Property")?;
        require_key(key, "Remove Property")?;

        let mut map = base_params(graph_id, request)?;
        map.insert(params::NODE_ID.to_string(), Value::String(node_id.into()));
        map.insert(params::PROPERTY.to_string(), Value::String(key.into()));
        self.run(StoreOperation::RemoveProperty, graph_id, &map)
            .await?;
        Ok(())
    }

    /// Remove a batch of properties from a node.
    pub async fn remove_properties(
        &self,
        graph_id: &str,
        node_id: &str,
        property_keys: &[String],
        request: &Request,
    ) -> EngineResult<()> {
        require_graph_id(graph_id, "Remove Properties")?;
        require_node_id(node_id, "Remove Properties")?;
        if property_keys.is_empty() {
            return Err(EngineError::client(
                codes::ERR_GRAPH_INVALID_PROPERTY,
                "Invalid property keys | [Remove Properties Operation Failed.]",
            ));
        }

        let mut map = base_params(graph_id, request)?;
        map.insert(params::NODE_ID.to_string(), Value::String(node_id.into()));
        map.insert(params::KEYS.to_string(), to_param(property_keys)?);
        self.run(StoreOperation::RemoveProperties, graph_id, &map)
            .await?;
        Ok(())
    }

    /// Delete a node.
    pub async fn delete_node(
        &self,
        graph_id: &str,
        node_id: &str,
        request: &Request,
    ) -> EngineResult<()> {
        require_graph_id(graph_id, "Delete Node")?;
        require_node_id(node_id, "Delete Node")?;

        let mut map = base_params(graph_id, request)?;
        map.insert(params::NODE_ID.to_string(), Value::String(node_id.into()));
        self.run(StoreOperation::DeleteNode, graph_id, &map).await?;
        Ok(())
    }

    /// Insert-or-update the root node for a graph.
    ///
    /// Synthesizes the deterministic root identifier, seeds audit metadata
    /// and zeroed aggregate counters, then writes.
    pub async fn upsert_root_node(
        &self,
        graph_id: &str,
        request: &Request,
    ) -> EngineResult<Node> {
        require_graph_id(graph_id, "Upsert Root Node")?;

        let root_id = root_node_id(graph_id);
        let mut node = Node::new(graph_id, root_id.clone(), NodeType::RootNode);
        node.stamp_system_metadata();
        node.metadata.insert(
            keys::CREATED_ON.to_string(),
            Value::String(keys::audit_timestamp()),
        );
        node.metadata.insert(keys::NODES_COUNT.to_string(), Value::from(0));
        node.metadata
            .insert(keys::RELATIONS_COUNT.to_string(), Value::from(0));
        debug!(graph_id, root_id = %root_id, "initialized root node");

        let mut map = base_params(graph_id, request)?;
        map.insert(params::ROOT_NODE.to_string(), to_param(&node)?);
        self.run(StoreOperation::UpsertRootNode, graph_id, &map)
            .await?;
        Ok(node)
    }

    /// Shared path for single-node writes.
    async fn write_node(
        &self,
        operation: StoreOperation,
        graph_id: &str,
        node: &mut Node,
        request: &Request,
    ) -> EngineResult<()> {
        require_graph_id(graph_id, operation.as_str())?;
        if node.identifier.trim().is_empty() {
            return Err(EngineError::client(
                codes::ERR_GRAPH_INVALID_NODE,
                format!("Invalid node | [{} Operation Failed.]", operation),
            ));
        }

        let now = keys::audit_timestamp();
        if operation != StoreOperation::UpdateNode {
            node.metadata
                .entry(keys::CREATED_ON.to_string())
                .or_insert_with(|| Value::String(now.clone()));
        }
        node.metadata
            .insert(keys::LAST_UPDATED_ON.to_string(), Value::String(now));

        let mut map = base_params(graph_id, request)?;
        map.insert(params::NODE.to_string(), to_param(&node)?);
        let records = self.run(operation, graph_id, &map).await?;
        for record in &records {
            merge_version_key(record, node);
        }
        Ok(())
    }

    /// Resolve and execute one operation inside a call-scoped session.
    /// The session is dropped on every exit path.
    async fn run(
        &self,
        operation: StoreOperation,
        graph_id: &str,
        map: &ParamMap,
    ) -> EngineResult<Vec<NativeRecord>> {
        let query = self.resolver.resolve(operation, map);
        let mut session = self.driver.session(graph_id).await?;
        debug!(graph_id, %operation, "session acquired");
        session.run(&query, map).await
    }
}

/// Deterministic root-node identifier for a graph.
pub fn root_node_id(graph_id: &str) -> String {
    format!("{}_{}", graph_id, NodeType::RootNode.as_str())
}

fn require_graph_id(graph_id: &str, op_label: &str) -> EngineResult<()> {
    if graph_id.trim().is_empty() {
        return Err(EngineError::client(
            codes::ERR_GRAPH_INVALID_GRAPH_ID,
            format!("Invalid graph id | [{} Operation Failed.]", op_label),
        ));
    }
    Ok(())
}

fn require_node_id(node_id: &str, op_label: &str) -> EngineResult<()> {
    if node_id.trim().is_empty() {
        return Err(EngineError::client(
            codes::ERR_GRAPH_INVALID_NODE,
            format!("Invalid node id | [{} Operation Failed.]", op_label),
        ));
    }
    Ok(())
}

fn require_key(key: &str, op_label: &str) -> EngineResult<()> {
    if key.trim().is_empty() {
        return Err(EngineError::client(
            codes::ERR_GRAPH_INVALID_PROPERTY,
            format!("Invalid property key | [{} Operation Failed.]", op_label),
        ));
    }
    Ok(())
}

fn base_params(graph_id: &str, request: &Request) -> EngineResult<ParamMap> {
    let mut map = ParamMap::new();
    map.insert(
        params::GRAPH_ID.to_string(),
        Value::String(graph_id.to_string()),
    );
    map.insert(params::REQUEST.to_string(), to_param(request)?);
    Ok(map)
}

fn to_param<T: serde::Serialize + ?Sized>(value: &T) -> EngineResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        EngineError::server(
            codes::ERR_SYSTEM_EXCEPTION,
            format!("parameter serialization failed: {}", e),
        )
    })
}

/// Merge the store-assigned version token into the node metadata.
/// Absence is logged and swallowed: the primary write already succeeded.
fn merge_version_key(record: &NativeRecord, node: &mut Node) {
    let token = record
        .node(DEFAULT_NODE_HANDLE)
        .and_then(|n| n.property(keys::VERSION_KEY))
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty());
    match token {
        Some(version) => {
            node.metadata.insert(
                keys::VERSION_KEY.to_string(),
                Value::String(version.to_string()),
            );
        }
        None => warn!(
            node_id = %node.identifier,
            "no version token on returned record"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::query::PassthroughResolver;
    use crate::store::traits::{NativeNode, StoreSession};
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Driver that counts sessions and replays canned records.
    struct ScriptedDriver {
        sessions_opened: AtomicUsize,
        records: Mutex<Vec<NativeRecord>>,
    }

    impl ScriptedDriver {
        fn new(records: Vec<NativeRecord>) -> Self {
            Self {
                sessions_opened: AtomicUsize::new(0),
                records: Mutex::new(records),
            }
        }
    }

    struct ScriptedSession {
        records: Vec<NativeRecord>,
    }

    #[async_trait]
    impl StoreSession for ScriptedSession {
        async fn run(
            &mut self,
            _query: &str,
            _params: &ParamMap,
        ) -> EngineResult<Vec<NativeRecord>> {
            Ok(self.records.clone())
        }
    }

    #[async_trait]
    impl GraphDriver for ScriptedDriver {
        async fn session(&self, _graph_id: &str) -> EngineResult<Box<dyn StoreSession>> {
            self.sessions_opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedSession {
                records: self.records.lock().unwrap().clone(),
            }))
        }
    }

    fn client_with(records: Vec<NativeRecord>) -> (StoreClient, Arc<ScriptedDriver>) {
        let driver = Arc::new(ScriptedDriver::new(records));
        let client = StoreClient::new(driver.clone(), Arc::new(PassthroughResolver));
        (client, driver)
    }

    fn version_record(version: &str) -> NativeRecord {
        let mut props = IndexMap::new();
        props.insert(keys::VERSION_KEY.to_string(), Value::String(version.into()));
        NativeRecord::new().with_node(DEFAULT_NODE_HANDLE, NativeNode::new(props))
    }

    #[tokio::test]
    async fn blank_graph_id_never_reaches_the_store() {
        let (client, driver) = client_with(vec![]);
        let mut node = Node::new("", "do_1", NodeType::DataNode);
        let req = Request::new("graph-manager", "upsertNode");

        let err = client.upsert_node("  ", &mut node, &req).await.unwrap_err();
        assert_eq!(err.code(), codes::ERR_GRAPH_INVALID_GRAPH_ID);
        assert_eq!(driver.sessions_opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_node_id_is_a_client_error() {
        let (client, driver) = client_with(vec![]);
        let mut node = Node::new("domain", "   ", NodeType::DataNode);
        let req = Request::new("graph-manager", "createNode");

        let err = client
            .create_node("domain", &mut node, &req)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::ERR_GRAPH_INVALID_NODE);
        assert_eq!(driver.sessions_opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upsert_merges_version_token() {
        let (client, _) = client_with(vec![version_record("1757")]);
        let mut node = Node::new("domain", "do_1", NodeType::DataNode);
        let req = Request::new("graph-manager", "upsertNode");

        client.upsert_node("domain", &mut node, &req).await.unwrap();
        assert_eq!(node.version_key(), Some("1757"));
        // audit dates are stamped on the way in
        assert!(node.metadata.contains_key(keys::CREATED_ON));
        assert!(node.metadata.contains_key(keys::LAST_UPDATED_ON));
    }

    #[tokio::test]
    async fn missing_version_token_is_swallowed() {
        // Record comes back without a versionKey property; the write still
        // succeeds and no token key is added.
        let record = NativeRecord::new().with_node(DEFAULT_NODE_HANDLE, NativeNode::default());
        let (client, _) = client_with(vec![record]);
        let mut node = Node::new("domain", "do_1", NodeType::DataNode);
        let req = Request::new("graph-manager", "upsertNode");

        client.upsert_node("domain", &mut node, &req).await.unwrap();
        assert_eq!(node.version_key(), None);
    }

    #[tokio::test]
    async fn root_upsert_seeds_counters_and_identifier() {
        let (client, _) = client_with(vec![]);
        let req = Request::new("graph-manager", "upsertRootNode");

        let root = client.upsert_root_node("domain", &req).await.unwrap();
        assert_eq!(root.identifier, "domain_ROOT_NODE");
        assert_eq!(root.node_type(), NodeType::RootNode);
        assert_eq!(root.metadata.get(keys::NODES_COUNT), Some(&Value::from(0)));
        assert_eq!(
            root.metadata.get(keys::RELATIONS_COUNT),
            Some(&Value::from(0))
        );
        assert!(root.metadata.contains_key(keys::CREATED_ON));
        assert_eq!(
            root.metadata.get(keys::IL_UNIQUE_ID),
            Some(&Value::String("domain_ROOT_NODE".into()))
        );
    }

    #[tokio::test]
    async fn empty_import_batch_is_rejected() {
        let (client, driver) = client_with(vec![]);
        let req = Request::new("graph-manager", "importNodes");
        let err = client
            .import_nodes("domain", &mut [], &req)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::ERR_GRAPH_INVALID_NODE);
        assert_eq!(driver.sessions_opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn import_matches_tokens_by_unique_id() {
        let mut props = IndexMap::new();
        props.insert(keys::IL_UNIQUE_ID.to_string(), Value::String("do_2".into()));
        props.insert(keys::VERSION_KEY.to_string(), Value::String("42".into()));
        let record = NativeRecord::new().with_node(DEFAULT_NODE_HANDLE, NativeNode::new(props));

        let (client, _) = client_with(vec![record]);
        let mut nodes = vec![
            Node::new("domain", "do_1", NodeType::DataNode),
            Node::new("domain", "do_2", NodeType::DataNode),
        ];
        let req = Request::new("graph-manager", "importNodes");

        client
            .import_nodes("domain", &mut nodes, &req)
            .await
            .unwrap();
        assert_eq!(nodes[0].version_key(), None);
        assert_eq!(nodes[1].version_key(), Some("42"));
    }

    #[tokio::test]
    async fn property_ops_validate_inputs_first() {
        let (client, driver) = client_with(vec![]);
        let req = Request::new("graph-manager", "updateProperty");

        let err = client
            .update_property("domain", "do_1", "", Value::from("x"), &req)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::ERR_GRAPH_INVALID_PROPERTY);

        let err = client
            .update_properties("domain", "do_1", &Metadata::new(), &req)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::ERR_GRAPH_INVALID_PROPERTY);

        let err = client
            .remove_properties("domain", "do_1", &[], &req)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::ERR_GRAPH_INVALID_PROPERTY);

        assert_eq!(driver.sessions_opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delete_node_runs_one_session() {
        let (client, driver) = client_with(vec![]);
        let req = Request::new("graph-manager", "deleteNode");
        client.delete_node("domain", "do_1", &req).await.unwrap();
        assert_eq!(driver.sessions_opened.load(Ordering::SeqCst), 1);
    }
}
