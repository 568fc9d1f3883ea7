//! Performance telemetry for the dispatch layer.
//!
//! Sinks are write-only and fire-and-forget: a slow or broken sink must
//! never block or fail the response path.

use crate::envelope::{context_keys, Request};

/// One perf line: who ran what, and a marker/value pair
/// (STARTTIME/ENDTIME with a timestamp, or a status with elapsed millis).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfEntry {
    pub scenario: String,
    pub request_id: String,
    pub manager: String,
    pub operation: String,
    pub marker: String,
    pub value: i64,
}

impl PerfEntry {
    pub fn of(request: &Request, marker: impl Into<String>, value: i64) -> Self {
        Self {
            scenario: request.context_str(context_keys::SCENARIO_NAME).to_string(),
            request_id: request.context_str(context_keys::REQUEST_ID).to_string(),
            manager: request.manager.clone(),
            operation: request.operation.clone(),
            marker: marker.into(),
            value,
        }
    }
}

/// Write-only telemetry boundary.
pub trait PerfSink: Send + Sync {
    fn record(&self, entry: PerfEntry);
}

/// Default sink: structured log lines under the `perf` target.
#[derive(Debug, Default, Clone)]
pub struct TracingPerfSink;

impl PerfSink for TracingPerfSink {
    fn record(&self, entry: PerfEntry) {
        tracing::info!(
            target: "perf",
            "{},{},{},{},{},{}",
            entry.scenario,
            entry.request_id,
            entry.manager,
            entry.operation,
            entry.marker,
            entry.value
        );
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_reads_context_fields() {
        let req = crate::envelope::Request::new("graph-manager", "createNode")
            .with_scenario("load-test-1");
        let entry = PerfEntry::of(&req, "STARTTIME", 1000);
        assert_eq!(entry.scenario, "load-test-1");
        assert_eq!(entry.manager, "graph-manager");
        assert_eq!(entry.operation, "createNode");
        assert!(!entry.request_id.is_empty());
    }
}
