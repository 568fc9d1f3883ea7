//! Reserved metadata keys.
//!
//! These strings are part of the persisted-state layout of the external
//! property-graph store and must stay verbatim for interoperability.

/// Unique identifier of the node
pub const IL_UNIQUE_ID: &str = "IL_UNIQUE_ID";
/// System node type (DATA_NODE, ROOT_NODE, ...)
pub const IL_SYS_NODE_TYPE: &str = "IL_SYS_NODE_TYPE";
/// Domain object type (functional schema name)
pub const IL_FUNC_OBJECT_TYPE: &str = "IL_FUNC_OBJECT_TYPE";
/// Audit: creation timestamp
pub const CREATED_ON: &str = "createdOn";
/// Audit: last update timestamp
pub const LAST_UPDATED_ON: &str = "lastUpdatedOn";
/// Store-assigned optimistic-concurrency token
pub const VERSION_KEY: &str = "versionKey";
/// Aggregate node counter on the root node
pub const NODES_COUNT: &str = "nodesCount";
/// Aggregate relation counter on the root node
pub const RELATIONS_COUNT: &str = "relationsCount";

/// Audit timestamp format used by the store.
pub const AUDIT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Current time formatted as an audit timestamp.
pub fn audit_timestamp() -> String {
    chrono::Utc::now().format(AUDIT_DATE_FORMAT).to_string()
}
