//! Engine configuration: dispatch timeout and worker pool sizing.

use crate::error::{codes, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_pool_size() -> usize {
    4
}

/// Tunables for the dispatch layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound on a single worker invocation, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub dispatch_timeout_ms: u64,
    /// Workers per pool
    #[serde(default = "default_pool_size")]
    pub worker_pool_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_ms: default_timeout_ms(),
            worker_pool_size: default_pool_size(),
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file. Missing keys fall back to defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            EngineError::server(
                codes::ERR_SYSTEM_EXCEPTION,
                format!("failed to read config {}: {}", path.as_ref().display(), e),
            )
        })?;
        serde_yaml::from_str(&text).map_err(|e| {
            EngineError::server(codes::ERR_SYSTEM_EXCEPTION, format!("invalid config: {}", e))
        })
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }
}
