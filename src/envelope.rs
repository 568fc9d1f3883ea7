//! Request/Response envelope carried through the dispatch layer.
//!
//! A `Request` is created per call and never retained. Its `context` map
//! carries cross-cutting metadata (scenario name, request id, start time)
//! that the dispatcher stamps and reads back for telemetry only.

use crate::error::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Context keys written/read by the dispatcher.
pub mod context_keys {
    pub const START_TIME: &str = "start_time";
    pub const SCENARIO_NAME: &str = "scenario_name";
    pub const REQUEST_ID: &str = "request_id";
}

/// Well-known parameter keys.
pub mod param_keys {
    pub const GRAPH_ID: &str = "graphId";
}

/// A typed operation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Name of the manager (coordinator domain area) that owns the operation
    pub manager: String,
    /// Operation name, e.g. "validateRelation"
    pub operation: String,
    /// Operation parameters
    pub params: IndexMap<String, Value>,
    /// Cross-cutting metadata: scenario/trace id, request id, start time
    pub context: IndexMap<String, Value>,
}

impl Request {
    /// Create a request with a fresh request id in its context.
    pub fn new(manager: impl Into<String>, operation: impl Into<String>) -> Self {
        let mut context = IndexMap::new();
        context.insert(
            context_keys::REQUEST_ID.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
        Self {
            manager: manager.into(),
            operation: operation.into(),
            params: IndexMap::new(),
            context,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.context.insert(
            context_keys::SCENARIO_NAME.to_string(),
            Value::String(scenario.into()),
        );
        self
    }

    /// The graph id parameter, when present.
    pub fn graph_id(&self) -> Option<&str> {
        self.params.get(param_keys::GRAPH_ID).and_then(Value::as_str)
    }

    /// String-valued context entry, empty when absent.
    pub fn context_str(&self, key: &str) -> &str {
        self.context.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Stamp the dispatch start time (epoch millis) into the context.
    pub fn stamp_start_time(&mut self, millis: i64) {
        self.context
            .insert(context_keys::START_TIME.to_string(), Value::from(millis));
    }

    /// Read back the stamped start time.
    pub fn start_time(&self) -> Option<i64> {
        self.context
            .get(context_keys::START_TIME)
            .and_then(Value::as_i64)
    }
}

/// Outcome of a dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "successful")]
    Successful,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "failed")]
    Failed,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Error => "error",
            Self::Failed => "failed",
        }
    }
}

/// Coarse classification mirrored from the error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    Ok,
    ClientError,
    ServerError,
    ResourceNotFound,
}

impl From<&EngineError> for ResponseCode {
    fn from(e: &EngineError) -> Self {
        match e {
            EngineError::Client { .. } | EngineError::UnsupportedOperation { .. } => {
                Self::ClientError
            }
            EngineError::ResourceNotFound { .. } => Self::ResourceNotFound,
            // Timeout and anything unclassified report as server errors
            EngineError::Server { .. } | EngineError::Timeout { .. } => Self::ServerError,
        }
    }
}

/// The single reply to a dispatched request.
///
/// Callers react to `status`/`code`, never to internal error types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,
    pub response_code: ResponseCode,
    /// Stable error code, present on error
    pub code: Option<String>,
    /// Human-readable error message, present on error
    pub message: Option<String>,
    /// Operation payload
    pub result: IndexMap<String, Value>,
}

impl Response {
    /// A successful response carrying the given payload.
    pub fn success(result: IndexMap<String, Value>) -> Self {
        Self {
            status: ResponseStatus::Successful,
            response_code: ResponseCode::Ok,
            code: None,
            message: None,
            result,
        }
    }

    /// A successful response with no payload.
    pub fn ok() -> Self {
        Self::success(IndexMap::new())
    }

    /// An error response classified from the engine error.
    pub fn error(e: &EngineError) -> Self {
        Self {
            status: ResponseStatus::Error,
            response_code: ResponseCode::from(e),
            code: Some(e.code().to_string()),
            message: Some(e.message().to_string()),
            result: IndexMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Successful
    }
}
