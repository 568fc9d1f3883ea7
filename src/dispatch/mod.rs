//! Concurrent request dispatch.
//!
//! Domain-agnostic: this layer knows requests, responses, workers, and
//! deadlines, never node or relation semantics.

mod perf;
mod pool;
mod router;

pub use perf::{PerfEntry, PerfSink, TracingPerfSink};
pub use pool::{SelectionPolicy, Worker, WorkerPool};
pub use router::{spawn_router, PoolFactory, RouterHandle, RouterRegistry, INIT_COMPLETE};
