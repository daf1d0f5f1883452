//! Per-host operation results and run-level aggregation
//!
//! Every host unit of work ends in exactly one `OperationResult`, whether it
//! succeeded or died on any error in the taxonomy. Results are produced by
//! isolated tasks and appended at the aggregation point; there is no shared
//! mutable error state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::errors::OperationError;

#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub group: String,
    pub host: String,
    pub operation: String,
    pub success: bool,
    pub message: String,
    pub error_kind: Option<&'static str>,
    pub duration_seconds: f64,
    pub finished_at: DateTime<Utc>,
}

impl OperationResult {
    pub fn ok(
        group: &str,
        host: &str,
        operation: &str,
        message: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            group: group.to_string(),
            host: host.to_string(),
            operation: operation.to_string(),
            success: true,
            message: message.into(),
            error_kind: None,
            duration_seconds: duration.as_secs_f64(),
            finished_at: Utc::now(),
        }
    }

    pub fn failed(
        group: &str,
        host: &str,
        operation: &str,
        error: &OperationError,
        duration: Duration,
    ) -> Self {
        Self {
            group: group.to_string(),
            host: host.to_string(),
            operation: operation.to_string(),
            success: false,
            message: error.to_string(),
            error_kind: Some(error.kind()),
            duration_seconds: duration.as_secs_f64(),
            finished_at: Utc::now(),
        }
    }
}

/// All results for one invocation, in completion order per group.
#[derive(Debug, Default)]
pub struct RunSummary {
    results: Vec<OperationResult>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: OperationResult) {
        self.results.push(result);
    }

    pub fn extend(&mut self, results: Vec<OperationResult>) {
        self.results.extend(results);
    }

    pub fn results(&self) -> &[OperationResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<OperationResult> {
        self.results
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Human-readable results table, one block per group. Verbose mode adds
    /// the error taxonomy kind per failed host.
    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();
        let mut groups: Vec<&str> = self.results.iter().map(|r| r.group.as_str()).collect();
        groups.dedup();

        for group in groups {
            out.push_str(&format!("{}\n", "=".repeat(60)));
            out.push_str(&format!("RESULTS - {}\n", group));
            out.push_str(&format!("{}\n", "=".repeat(60)));

            for result in self.results.iter().filter(|r| r.group == group) {
                let status = if result.success { "OK" } else { "FAILED" };
                let mut line = format!(
                    "  {:<20} {:<7} {} ({:.1}s)",
                    result.host, status, result.operation, result.duration_seconds
                );
                if !result.success {
                    line.push_str(&format!(": {}", result.message));
                    if verbose {
                        if let Some(kind) = result.error_kind {
                            line.push_str(&format!(" [{}]", kind));
                        }
                    }
                }
                out.push_str(&line);
                out.push('\n');
            }
        }

        out.push_str(&format!("{}\n", "-".repeat(60)));
        out.push_str(&format!(
            "  Total: {}  |  Succeeded: {}  |  Failed: {}\n",
            self.results.len(),
            self.succeeded(),
            self.failed()
        ));
        out
    }
}
