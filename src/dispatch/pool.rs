//! Worker pools and selection policy.
//!
//! A pool is a fixed set of workers built once at init. Selection is
//! pluggable per pool: round robin, or a stable hash on the request's graph
//! id so one graph's operations land on one worker.

use crate::envelope::{Request, Response};
use crate::error::{codes, EngineError, EngineResult};
use async_trait::async_trait;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A pooled worker: executes one typed request to completion.
#[async_trait]
pub trait Worker: Send + Sync {
    async fn invoke(&self, request: Request) -> Response;
}

/// How a pool picks a worker for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    #[default]
    RoundRobin,
    /// Stable hash on the graph id parameter (falls back to the operation
    /// name when the request carries no graph id)
    GraphHash,
}

/// A bounded set of workers with a selection policy.
pub struct WorkerPool {
    workers: Vec<Arc<dyn Worker>>,
    policy: SelectionPolicy,
    next: AtomicUsize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl WorkerPool {
    pub fn new(workers: Vec<Arc<dyn Worker>>, policy: SelectionPolicy) -> EngineResult<Self> {
        if workers.is_empty() {
            return Err(EngineError::client(
                codes::ERR_GRAPH_NOT_INITIALIZED,
                "worker pool cannot be empty",
            ));
        }
        Ok(Self {
            workers,
            policy,
            next: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Pick a worker for the request according to the pool's policy.
    pub fn select(&self, request: &Request) -> Arc<dyn Worker> {
        let index = match self.policy {
            SelectionPolicy::RoundRobin => {
                self.next.fetch_add(1, Ordering::Relaxed) % self.workers.len()
            }
            SelectionPolicy::GraphHash => {
                let key = request.graph_id().unwrap_or(&request.operation);
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                (hasher.finish() as usize) % self.workers.len()
            }
        };
        Arc::clone(&self.workers[index])
    }
}
