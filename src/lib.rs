//! Trellis: graph-engine middleware over an external property-graph store.
//!
//! Accepts typed graph operations, enforces domain invariants on top of a
//! generic property-graph store, and executes them concurrently with
//! bounded timeouts and structured error classification.
//!
//! # Core Concepts
//!
//! - **Dispatch**: a coordinator per manager routes requests to pooled
//!   workers under a deadline; callers always get exactly one response.
//! - **Model**: nodes, typed relations (closed taxonomy with per-type
//!   delete policy), and Set/Sequence collections built from membership
//!   relations.
//! - **Validation**: independent asynchronous checks (cycle, endpoint
//!   type, schema compatibility) joined wait-for-all into a per-node
//!   message map.
//! - **Store**: a client that maps domain objects to the external store's
//!   primitives through scoped sessions and an opaque query resolver.
//!
//! # Example
//!
//! ```
//! use trellis::{EngineConfig, Request};
//!
//! let config = EngineConfig::default();
//! let request = Request::new("graph-manager", "upsertRootNode")
//!     .with_param("graphId", "domain");
//! assert_eq!(request.graph_id(), Some("domain"));
//! assert_eq!(config.dispatch_timeout_ms, 30_000);
//! ```

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod model;
pub mod store;
pub mod validation;
pub mod worker;

pub use config::EngineConfig;
pub use dispatch::{
    spawn_router, PerfEntry, PerfSink, PoolFactory, RouterHandle, RouterRegistry,
    SelectionPolicy, TracingPerfSink, Worker, WorkerPool, INIT_COMPLETE,
};
pub use envelope::{Request, Response, ResponseCode, ResponseStatus};
pub use error::{EngineError, EngineResult};
pub use model::{Collection, CollectionKind, Metadata, Node, NodeType, Relation, RelationType};
pub use store::{
    GraphDriver, GraphStore, MemoryStore, NativeNode, NativeRecord, QueryResolver, StoreClient,
    StoreOperation, StoreSession,
};
pub use validation::{
    is_valid, MessageMap, PermissiveSchema, RuleSetSchema, SchemaRegistry, ValidationEngine,
};
pub use worker::GraphWorker;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
