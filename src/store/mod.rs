//! Persistence mapping layer over the external property-graph store.

mod client;
mod memory;
pub mod query;
mod traits;

pub use client::{root_node_id, StoreClient};
pub use memory::MemoryStore;
pub use query::{ParamMap, PassthroughResolver, QueryResolver, StoreOperation};
pub use traits::{
    native_from_node, node_from_native, GraphDriver, GraphStore, NativeNode, NativeRecord,
    StoreSession, DEFAULT_NODE_HANDLE,
};
