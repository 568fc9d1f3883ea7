//! Graph manager worker: maps envelope operations onto the domain model,
//! validation engine, and store client.
//!
//! This is the concrete `Worker` the dispatcher pools. Domain errors are
//! folded into error responses here; the dispatcher only ever sees a
//! `Response`.

use crate::dispatch::Worker;
use crate::envelope::{Request, Response};
use crate::error::{codes, EngineError, EngineResult};
use crate::model::{keys, Collection, CollectionKind, Metadata, Node, Relation, RelationType};
use crate::store::{GraphStore, StoreClient};
use crate::validation::ValidationEngine;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Operation names accepted by the graph manager.
pub mod operations {
    pub const CREATE_NODE: &str = "createNode";
    pub const UPSERT_NODE: &str = "upsertNode";
    pub const UPDATE_NODE: &str = "updateNode";
    pub const DELETE_NODE: &str = "deleteNode";
    pub const UPSERT_ROOT_NODE: &str = "upsertRootNode";
    pub const VALIDATE_RELATION: &str = "validateRelation";
    pub const DELETE_RELATION: &str = "deleteRelation";
    pub const ADD_MEMBERS: &str = "addMembers";
    pub const VALIDATE_COLLECTION: &str = "validateCollection";
    pub const GET_PROPERTY: &str = "getProperty";
    pub const SET_PROPERTY: &str = "setProperty";
    pub const REMOVE_PROPERTY: &str = "removeProperty";
    pub const UPDATE_METADATA: &str = "updateMetadata";
}

/// The graph domain worker.
pub struct GraphWorker {
    client: Arc<StoreClient>,
    store: Arc<dyn GraphStore>,
    validator: Arc<ValidationEngine>,
}

impl GraphWorker {
    pub fn new(
        client: Arc<StoreClient>,
        store: Arc<dyn GraphStore>,
        validator: Arc<ValidationEngine>,
    ) -> Self {
        Self {
            client,
            store,
            validator,
        }
    }

    async fn handle(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        use operations::*;
        debug!(operation = %request.operation, "handling graph operation");
        match request.operation.as_str() {
            CREATE_NODE | UPSERT_NODE | UPDATE_NODE => self.write_node(request).await,
            DELETE_NODE => self.delete_node(request).await,
            UPSERT_ROOT_NODE => self.upsert_root_node(request).await,
            VALIDATE_RELATION => self.validate_relation(request).await,
            DELETE_RELATION => self.delete_relation(request).await,
            ADD_MEMBERS => self.add_members(request).await,
            VALIDATE_COLLECTION => self.validate_collection(request).await,
            GET_PROPERTY => self.get_property(request).await,
            SET_PROPERTY => self.set_property(request).await,
            REMOVE_PROPERTY => self.remove_property(request).await,
            UPDATE_METADATA => self.update_metadata(request).await,
            other => Err(EngineError::unsupported(format!(
                "operation {} is not supported by the graph manager",
                other
            ))),
        }
    }

    async fn write_node(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        let graph_id = str_param(request, "graphId")?;
        let mut node: Node = object_param(request, "node")?;
        node.stamp_system_metadata();
        match request.operation.as_str() {
            operations::CREATE_NODE => {
                self.client.create_node(graph_id, &mut node, request).await?
            }
            operations::UPDATE_NODE => {
                self.client.update_node(graph_id, &mut node, request).await?
            }
            _ => self.client.upsert_node(graph_id, &mut node, request).await?,
        }
        let mut result = IndexMap::new();
        result.insert("node_id".to_string(), Value::String(node.identifier.clone()));
        if let Some(version) = node.version_key() {
            result.insert(
                keys::VERSION_KEY.to_string(),
                Value::String(version.to_string()),
            );
        }
        Ok(result)
    }

    async fn delete_node(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        let graph_id = str_param(request, "graphId")?;
        let node_id = str_param(request, "nodeId")?;
        self.client.delete_node(graph_id, node_id, request).await?;
        Ok(IndexMap::new())
    }

    async fn upsert_root_node(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        let graph_id = str_param(request, "graphId")?;
        let root = self.client.upsert_root_node(graph_id, request).await?;
        let mut result = IndexMap::new();
        result.insert("node_id".to_string(), Value::String(root.identifier.clone()));
        result.insert(
            "node".to_string(),
            serde_json::to_value(&root).map_err(serialization_error)?,
        );
        Ok(result)
    }

    async fn validate_relation(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        let relation = relation_from(request)?;
        let messages = self.validator.validate_relation(&relation).await?;
        let mut result = IndexMap::new();
        result.insert(
            "messages".to_string(),
            serde_json::to_value(&messages).map_err(serialization_error)?,
        );
        result.insert(
            "valid".to_string(),
            Value::Bool(crate::validation::is_valid(&messages)),
        );
        Ok(result)
    }

    async fn delete_relation(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        let relation = relation_from(request)?;
        relation.check_deletable()?;
        let deleted = self
            .store
            .delete_relation(&relation.graph_id, &relation)
            .await?;
        let mut result = IndexMap::new();
        result.insert("deleted".to_string(), Value::Bool(deleted));
        Ok(result)
    }

    async fn add_members(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        let collection = collection_from(request)?;
        let members: Vec<String> = object_param(request, "members")?;
        let relations = collection.add_members(self.store.as_ref(), &members).await?;
        let mut result = IndexMap::new();
        result.insert("added".to_string(), Value::from(relations.len()));
        Ok(result)
    }

    async fn validate_collection(
        &self,
        request: &Request,
    ) -> EngineResult<IndexMap<String, Value>> {
        let collection = collection_from(request)?;
        let messages = self.validator.validate_collection(&collection).await?;
        let mut result = IndexMap::new();
        result.insert(
            "messages".to_string(),
            serde_json::to_value(&messages).map_err(serialization_error)?,
        );
        Ok(result)
    }

    async fn get_property(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        if let Some(collection) = maybe_collection(request)? {
            let key = str_param(request, "key")?;
            let value = collection.get_property(key)?;
            let mut result = IndexMap::new();
            result.insert(key.to_string(), value);
            return Ok(result);
        }
        let graph_id = str_param(request, "graphId")?;
        let node_id = str_param(request, "nodeId")?;
        let key = str_param(request, "key")?;
        let node = self
            .store
            .get_node_by_id(graph_id, node_id)
            .await?
            .ok_or_else(|| {
                EngineError::not_found(
                    codes::ERR_GRAPH_NODE_NOT_FOUND,
                    format!("node {} not found", node_id),
                )
            })?;
        let mut result = IndexMap::new();
        result.insert(
            key.to_string(),
            node.metadata.get(key).cloned().unwrap_or(Value::Null),
        );
        Ok(result)
    }

    async fn set_property(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        if let Some(collection) = maybe_collection(request)? {
            collection.set_property(str_param(request, "key")?, Value::Null)?;
            return Ok(IndexMap::new());
        }
        let graph_id = str_param(request, "graphId")?;
        let node_id = str_param(request, "nodeId")?;
        let key = str_param(request, "key")?;
        let value = request.params.get("value").cloned().unwrap_or(Value::Null);
        self.client
            .update_property(graph_id, node_id, key, value, request)
            .await?;
        Ok(IndexMap::new())
    }

    async fn remove_property(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        if let Some(collection) = maybe_collection(request)? {
            collection.remove_property(str_param(request, "key")?)?;
            return Ok(IndexMap::new());
        }
        let graph_id = str_param(request, "graphId")?;
        let node_id = str_param(request, "nodeId")?;
        let key = str_param(request, "key")?;
        self.client
            .remove_property(graph_id, node_id, key, request)
            .await?;
        Ok(IndexMap::new())
    }

    async fn update_metadata(&self, request: &Request) -> EngineResult<IndexMap<String, Value>> {
        if let Some(collection) = maybe_collection(request)? {
            collection.update_metadata(&Metadata::new())?;
            return Ok(IndexMap::new());
        }
        let graph_id = str_param(request, "graphId")?;
        let node_id = str_param(request, "nodeId")?;
        let metadata: Metadata = object_param(request, "metadata")?;
        self.client
            .update_properties(graph_id, node_id, &metadata, request)
            .await?;
        Ok(IndexMap::new())
    }
}

#[async_trait]
impl Worker for GraphWorker {
    async fn invoke(&self, request: Request) -> Response {
        match self.handle(&request).await {
            Ok(result) => Response::success(result),
            Err(e) => Response::error(&e),
        }
    }
}

fn missing_param(key: &str) -> EngineError {
    EngineError::client(
        codes::ERR_GRAPH_INVALID_REQUEST,
        format!("missing or invalid parameter: {}", key),
    )
}

fn str_param<'a>(request: &'a Request, key: &str) -> EngineResult<&'a str> {
    request
        .params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing_param(key))
}

fn object_param<T: serde::de::DeserializeOwned>(request: &Request, key: &str) -> EngineResult<T> {
    let value = request.params.get(key).ok_or_else(|| missing_param(key))?;
    serde_json::from_value(value.clone()).map_err(|_| missing_param(key))
}

fn serialization_error(e: serde_json::Error) -> EngineError {
    EngineError::server(
        codes::ERR_SYSTEM_EXCEPTION,
        format!("result serialization failed: {}", e),
    )
}

fn relation_from(request: &Request) -> EngineResult<Relation> {
    let graph_id = str_param(request, "graphId")?;
    let start = str_param(request, "startNodeId")?;
    let end = str_param(request, "endNodeId")?;
    let relation_type = RelationType::parse(
        request
            .params
            .get("relationType")
            .and_then(Value::as_str)
            .unwrap_or(""),
    )?;
    Ok(Relation::new(graph_id, start, relation_type, end))
}

fn collection_from(request: &Request) -> EngineResult<Collection> {
    maybe_collection(request)?.ok_or_else(|| missing_param("collectionId"))
}

/// A collection target, when the request addresses one.
fn maybe_collection(request: &Request) -> EngineResult<Option<Collection>> {
    let Some(id) = request.params.get("collectionId").and_then(Value::as_str) else {
        return Ok(None);
    };
    let graph_id = str_param(request, "graphId")?;
    let kind_name = str_param(request, "collectionType")?;
    let kind = CollectionKind::parse(kind_name)
        .ok_or_else(|| missing_param("collectionType"))?;
    Ok(Some(Collection::new(graph_id, id, kind)))
}
