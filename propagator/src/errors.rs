//! Error types for fleet template propagation
//!
//! Every failure that can end a per-host unit of work is one of these
//! variants. The orchestrator converts them into per-host operation results
//! at the host boundary; they never abort sibling hosts or groups.

use std::fmt;

/// Failure of a single export/import/validate unit of work against one
/// management controller.
#[derive(Debug)]
pub enum OperationError {
    /// Credentials rejected by the controller. Never retried.
    Auth { host: String },

    /// Network-level or transient HTTP failure that survived the full
    /// retry budget.
    Transport {
        host: String,
        attempts: u32,
        detail: String,
    },

    /// The controller reported an explicit terminal failure state for a job.
    JobFailed {
        host: String,
        job_id: String,
        state: String,
        message: String,
    },

    /// The job never reached a terminal state within the wall-clock budget.
    JobTimeout {
        host: String,
        job_id: String,
        waited_seconds: u64,
    },

    /// A reboot-window uncertainty (job resource gone) that the confirmatory
    /// re-query could not resolve within its window.
    AmbiguousOutcome {
        host: String,
        job_id: String,
        detail: String,
    },

    /// Profile document read/write failure.
    Persistence { path: String, detail: String },

    /// The controller answered, but not in a shape we can work with
    /// (rejected submit, missing job handle, empty export payload).
    Protocol { host: String, detail: String },
}

impl OperationError {
    /// Stable label for the verbose summary and for tests asserting on
    /// failure classification.
    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::Auth { .. } => "auth",
            OperationError::Transport { .. } => "transport",
            OperationError::JobFailed { .. } => "job_failed",
            OperationError::JobTimeout { .. } => "job_timeout",
            OperationError::AmbiguousOutcome { .. } => "ambiguous",
            OperationError::Persistence { .. } => "persistence",
            OperationError::Protocol { .. } => "protocol",
        }
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::Auth { host } => {
                write!(f, "Authentication failed for {} - check credentials", host)
            }
            OperationError::Transport {
                host,
                attempts,
                detail,
            } => {
                write!(
                    f,
                    "Request to {} failed after {} attempt(s): {}",
                    host, attempts, detail
                )
            }
            OperationError::JobFailed {
                host,
                job_id,
                state,
                message,
            } => {
                write!(
                    f,
                    "Job {} on {} finished with state '{}': {}",
                    job_id, host, state, message
                )
            }
            OperationError::JobTimeout {
                host,
                job_id,
                waited_seconds,
            } => {
                write!(
                    f,
                    "Job {} on {} did not complete within {}s",
                    job_id, host, waited_seconds
                )
            }
            OperationError::AmbiguousOutcome {
                host,
                job_id,
                detail,
            } => {
                write!(
                    f,
                    "Job {} on {} ended ambiguously and could not be confirmed: {}",
                    job_id, host, detail
                )
            }
            OperationError::Persistence { path, detail } => {
                write!(f, "Profile store failure for '{}': {}", path, detail)
            }
            OperationError::Protocol { host, detail } => {
                write!(f, "Unexpected response from {}: {}", host, detail)
            }
        }
    }
}

impl std::error::Error for OperationError {}
