//! Request routing coordinator.
//!
//! One coordinator task per manager owns a worker pool and a message
//! channel. The pool is built lazily on the first init signal and never
//! rebuilt; repeat inits ack without side effects. Every dispatched request
//! gets exactly one reply: the worker's own response, or a classified
//! error synthesis when the worker panics or misses the deadline. A worker
//! that completes after the deadline has its result discarded.

use super::perf::{PerfEntry, PerfSink};
use super::pool::WorkerPool;
use crate::config::EngineConfig;
use crate::envelope::{Request, Response};
use crate::error::{codes, EngineError, EngineResult};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// Acknowledgement returned by the init signal.
pub const INIT_COMPLETE: &str = "initComplete";

/// Builds a pool on demand. Called at most once per coordinator lifetime
/// (only while no pool exists).
pub type PoolFactory = Box<dyn Fn() -> EngineResult<WorkerPool> + Send>;

enum RouterMessage {
    Init(oneshot::Sender<EngineResult<&'static str>>),
    Dispatch(Box<Request>, oneshot::Sender<Response>),
}

/// Caller-side handle to a coordinator task.
#[derive(Clone)]
pub struct RouterHandle {
    tx: mpsc::Sender<RouterMessage>,
}

impl RouterHandle {
    /// Send the initialization signal. Idempotent: the first call builds
    /// the pool, later calls just ack.
    pub async fn init(&self) -> EngineResult<&'static str> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(RouterMessage::Init(ack_tx))
            .await
            .map_err(|_| coordinator_gone())?;
        ack_rx.await.map_err(|_| coordinator_gone())?
    }

    /// Dispatch a request and await its single response.
    pub async fn dispatch(&self, request: Request) -> Response {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(RouterMessage::Dispatch(Box::new(request), reply_tx))
            .await
            .is_err()
        {
            return Response::error(&coordinator_gone());
        }
        match reply_rx.await {
            Ok(response) => response,
            Err(_) => Response::error(&coordinator_gone()),
        }
    }
}

fn coordinator_gone() -> EngineError {
    EngineError::server(codes::ERR_SYSTEM_EXCEPTION, "request coordinator is gone")
}

/// Spawn the coordinator task for one manager.
pub fn spawn_router(
    config: EngineConfig,
    factory: PoolFactory,
    perf: Arc<dyn PerfSink>,
) -> RouterHandle {
    let (tx, mut rx) = mpsc::channel::<RouterMessage>(64);
    tokio::spawn(async move {
        let mut pool: Option<Arc<WorkerPool>> = None;
        while let Some(message) = rx.recv().await {
            match message {
                RouterMessage::Init(ack) => {
                    let outcome = if pool.is_some() {
                        Ok(INIT_COMPLETE)
                    } else {
                        match factory() {
                            Ok(built) => {
                                info!(workers = built.len(), "worker pool initialized");
                                pool = Some(Arc::new(built));
                                Ok(INIT_COMPLETE)
                            }
                            Err(e) => Err(e),
                        }
                    };
                    let _ = ack.send(outcome);
                }
                RouterMessage::Dispatch(request, reply) => match &pool {
                    None => {
                        let e = EngineError::client(
                            codes::ERR_GRAPH_NOT_INITIALIZED,
                            "router received a request before init",
                        );
                        let _ = reply.send(Response::error(&e));
                    }
                    Some(pool) => {
                        dispatch_one(*request, reply, pool, &config, &perf);
                    }
                },
            }
        }
    });
    RouterHandle { tx }
}

/// Hand one request to a worker under the configured deadline. Runs on its
/// own task so slow workers never stall the coordinator loop.
fn dispatch_one(
    mut request: Request,
    reply: oneshot::Sender<Response>,
    pool: &Arc<WorkerPool>,
    config: &EngineConfig,
    perf: &Arc<dyn PerfSink>,
) {
    let start = chrono::Utc::now().timestamp_millis();
    request.stamp_start_time(start);
    perf.record(PerfEntry::of(&request, "STARTTIME", start));

    let worker = pool.select(&request);
    let timeout = config.dispatch_timeout();
    let perf = Arc::clone(perf);
    tokio::spawn(async move {
        let invocation = tokio::spawn({
            let request = request.clone();
            async move { worker.invoke(request).await }
        });
        let outcome = tokio::time::timeout(timeout, invocation).await;
        let end = chrono::Utc::now().timestamp_millis();
        let elapsed = end - start;

        let response = match outcome {
            Ok(Ok(response)) => {
                perf.record(PerfEntry::of(&request, "ENDTIME", end));
                perf.record(PerfEntry::of(
                    &request,
                    response.status.as_str().to_uppercase(),
                    elapsed,
                ));
                response
            }
            Ok(Err(join_error)) => {
                error!(
                    manager = %request.manager,
                    operation = %request.operation,
                    "worker failed: {}",
                    join_error
                );
                let e = EngineError::server(
                    codes::ERR_SYSTEM_EXCEPTION,
                    format!("worker failed: {}", join_error),
                );
                perf.record(PerfEntry::of(&request, "ERROR", elapsed));
                Response::error(&e)
            }
            Err(_) => {
                // The orphaned worker keeps running; its late result is
                // discarded. Delivery to the caller is at-most-once.
                let e = EngineError::timeout(format!(
                    "{} did not complete within {}ms",
                    request.operation,
                    timeout.as_millis()
                ));
                perf.record(PerfEntry::of(&request, "TIMEOUT", elapsed));
                Response::error(&e)
            }
        };
        let _ = reply.send(response);
    });
}

/// Process-wide registry of coordinators, keyed by manager name.
#[derive(Default)]
pub struct RouterRegistry {
    routers: DashMap<String, RouterHandle>,
}

impl RouterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, manager: impl Into<String>, handle: RouterHandle) {
        self.routers.insert(manager.into(), handle);
    }

    /// Route a request to its manager's coordinator.
    pub async fn dispatch(&self, request: Request) -> Response {
        let handle = match self.routers.get(&request.manager) {
            Some(entry) => entry.clone(),
            None => {
                return Response::error(&EngineError::client(
                    codes::ERR_GRAPH_NOT_INITIALIZED,
                    format!("no router registered for manager {}", request.manager),
                ))
            }
        };
        handle.dispatch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::perf::test_support::CollectingSink;
    use crate::dispatch::pool::{SelectionPolicy, Worker};
    use crate::envelope::ResponseStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct EchoWorker;

    #[async_trait]
    impl Worker for EchoWorker {
        async fn invoke(&self, request: Request) -> Response {
            let mut result = indexmap::IndexMap::new();
            result.insert("operation".to_string(), serde_json::json!(request.operation));
            Response::success(result)
        }
    }

    struct SlowWorker {
        delay: Duration,
        completions: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Worker for SlowWorker {
        async fn invoke(&self, _request: Request) -> Response {
            tokio::time::sleep(self.delay).await;
            self.completions.fetch_add(1, Ordering::SeqCst);
            Response::ok()
        }
    }

    struct PanickingWorker;

    #[async_trait]
    impl Worker for PanickingWorker {
        async fn invoke(&self, _request: Request) -> Response {
            panic!("worker blew up");
        }
    }

    fn factory_for(worker: Arc<dyn Worker>, builds: Arc<AtomicUsize>) -> PoolFactory {
        Box::new(move || {
            builds.fetch_add(1, Ordering::SeqCst);
            WorkerPool::new(vec![Arc::clone(&worker)], SelectionPolicy::RoundRobin)
        })
    }

    fn test_config(timeout_ms: u64) -> EngineConfig {
        EngineConfig {
            dispatch_timeout_ms: timeout_ms,
            worker_pool_size: 1,
        }
    }

    #[tokio::test]
    async fn init_is_idempotent_and_builds_pool_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let router = spawn_router(
            test_config(1000),
            factory_for(Arc::new(EchoWorker), builds.clone()),
            Arc::new(CollectingSink::default()),
        );

        assert_eq!(router.init().await.unwrap(), INIT_COMPLETE);
        assert_eq!(router.init().await.unwrap(), INIT_COMPLETE);
        assert_eq!(router.init().await.unwrap(), INIT_COMPLETE);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispatch_before_init_is_a_client_error() {
        let builds = Arc::new(AtomicUsize::new(0));
        let router = spawn_router(
            test_config(1000),
            factory_for(Arc::new(EchoWorker), builds.clone()),
            Arc::new(CollectingSink::default()),
        );

        let resp = router.dispatch(Request::new("m", "op")).await;
        assert_eq!(resp.status, ResponseStatus::Error);
        assert_eq!(resp.code.as_deref(), Some(codes::ERR_GRAPH_NOT_INITIALIZED));
        assert_eq!(builds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_dispatch_forwards_worker_response() {
        let sink = CollectingSink::default();
        let router = spawn_router(
            test_config(1000),
            factory_for(Arc::new(EchoWorker), Arc::new(AtomicUsize::new(0))),
            Arc::new(sink.clone()),
        );
        router.init().await.unwrap();

        let resp = router
            .dispatch(Request::new("graph-manager", "createNode").with_scenario("s1"))
            .await;
        assert!(resp.is_success());
        assert_eq!(resp.result["operation"], serde_json::json!("createNode"));

        let markers = sink.markers();
        assert!(markers.contains(&"STARTTIME".to_string()));
        assert!(markers.contains(&"ENDTIME".to_string()));
        assert!(markers.contains(&"SUCCESSFUL".to_string()));
    }

    #[tokio::test]
    async fn timeout_synthesizes_exactly_one_error_response() {
        let completions = Arc::new(AtomicUsize::new(0));
        let sink = CollectingSink::default();
        let worker = Arc::new(SlowWorker {
            delay: Duration::from_millis(200),
            completions: completions.clone(),
        });
        let router = spawn_router(
            test_config(20),
            factory_for(worker, Arc::new(AtomicUsize::new(0))),
            Arc::new(sink.clone()),
        );
        router.init().await.unwrap();

        let resp = router.dispatch(Request::new("m", "slowOp")).await;
        assert_eq!(resp.status, ResponseStatus::Error);
        assert_eq!(resp.code.as_deref(), Some(codes::ERR_REQUEST_TIMEOUT));
        assert!(sink.markers().contains(&"TIMEOUT".to_string()));
        // the orphaned worker had not completed when the caller got its reply
        assert_eq!(completions.load(Ordering::SeqCst), 0);

        // late completion is discarded, not delivered
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_worker_becomes_a_server_error() {
        let router = spawn_router(
            test_config(1000),
            factory_for(Arc::new(PanickingWorker), Arc::new(AtomicUsize::new(0))),
            Arc::new(CollectingSink::default()),
        );
        router.init().await.unwrap();

        let resp = router.dispatch(Request::new("m", "op")).await;
        assert_eq!(resp.status, ResponseStatus::Error);
        assert_eq!(resp.code.as_deref(), Some(codes::ERR_SYSTEM_EXCEPTION));
    }

    #[tokio::test]
    async fn concurrent_dispatches_each_get_one_response() {
        let router = spawn_router(
            test_config(1000),
            factory_for(Arc::new(EchoWorker), Arc::new(AtomicUsize::new(0))),
            Arc::new(CollectingSink::default()),
        );
        router.init().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let router = router.clone();
            handles.push(tokio::spawn(async move {
                router.dispatch(Request::new("m", format!("op{}", i))).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }
    }

    #[tokio::test]
    async fn registry_routes_by_manager_name() {
        let registry = RouterRegistry::new();
        let router = spawn_router(
            test_config(1000),
            factory_for(Arc::new(EchoWorker), Arc::new(AtomicUsize::new(0))),
            Arc::new(CollectingSink::default()),
        );
        router.init().await.unwrap();
        registry.register("graph-manager", router);

        let resp = registry
            .dispatch(Request::new("graph-manager", "createNode"))
            .await;
        assert!(resp.is_success());

        let resp = registry.dispatch(Request::new("unknown", "op")).await;
        assert_eq!(resp.code.as_deref(), Some(codes::ERR_GRAPH_NOT_INITIALIZED));
    }
}
