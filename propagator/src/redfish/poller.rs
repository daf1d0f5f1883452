//! Asynchronous job polling
//!
//! Drives one controller-side task to a terminal state. Imports frequently
//! reboot the controller mid-job, so broken reads (transport failures after
//! the client's own retries, truncated or empty bodies) are treated as
//! "still running" for a bounded grace window instead of failing the wait
//! outright. A 404 on the task resource is surfaced as its own outcome: the
//! caller knows whether a vanished job can mean success.

use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::errors::OperationError;
use crate::redfish::client::RedfishClient;

/// Terminal observation for one job.
#[derive(Debug)]
pub enum JobOutcome {
    /// Success marker seen; carries the final task document.
    Completed(Value),

    /// Explicit failure marker seen.
    Failed { state: String, message: String },

    /// The task resource returned 404 after existing — the controller most
    /// likely rebooted. Potential success for jobs that expect a reboot,
    /// failure otherwise; the caller decides.
    Vanished,
}

pub struct JobPoller {
    poll_interval: Duration,
    job_timeout: Duration,
    reboot_grace: Duration,
}

impl JobPoller {
    pub fn new(connection: &ConnectionConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(connection.poll_interval_seconds),
            job_timeout: Duration::from_secs(connection.job_timeout_seconds),
            reboot_grace: Duration::from_secs(connection.reboot_grace_seconds),
        }
    }

    /// Poll the job until a terminal state, 404, or the wall-clock budget
    /// expires. A timeout is always an error, never a silent success.
    pub async fn poll(
        &self,
        client: &mut RedfishClient,
        job_id: &str,
    ) -> Result<JobOutcome, OperationError> {
        let dialect = client.dialect();
        let task_path = dialect.task_path(job_id);
        let host = client.host().to_string();

        info!(
            "  Polling job {} on {} (interval={}s, timeout={}s)",
            job_id,
            host,
            self.poll_interval.as_secs(),
            self.job_timeout.as_secs()
        );

        let start = Instant::now();
        let mut broken_since: Option<Instant> = None;

        loop {
            if start.elapsed() >= self.job_timeout {
                return Err(OperationError::JobTimeout {
                    host,
                    job_id: job_id.to_string(),
                    waited_seconds: start.elapsed().as_secs(),
                });
            }

            match client.get(&task_path).await {
                Err(err @ OperationError::Auth { .. }) => return Err(err),
                Err(err) => {
                    // Transport budget already spent inside the client; keep
                    // waiting only while the reboot grace window is open.
                    if self.grace_expired(&mut broken_since) {
                        return Err(err);
                    }
                    warn!(
                        "  Job {} on {} unreadable, assuming reboot window: {}",
                        job_id, host, err
                    );
                }
                Ok(resp) if resp.status == 404 => {
                    info!("  Job {} on {} is gone (HTTP 404)", job_id, host);
                    return Ok(JobOutcome::Vanished);
                }
                Ok(resp) if resp.is_success() => match resp.json() {
                    Some(task) => {
                        broken_since = None;

                        let state = task
                            .get("TaskState")
                            .and_then(Value::as_str)
                            .unwrap_or("Unknown")
                            .to_string();
                        let message = first_message(&task);
                        info!(
                            "  [{}] Job {} - state: {} | {} ({}s elapsed)",
                            host,
                            job_id,
                            state,
                            message,
                            start.elapsed().as_secs()
                        );

                        if dialect.is_success_state(&state) {
                            return Ok(JobOutcome::Completed(task));
                        }
                        if dialect.is_failure_state(&state) {
                            return Ok(JobOutcome::Failed { state, message });
                        }
                    }
                    None => {
                        // Truncated/empty bodies are normal while the
                        // controller resets.
                        if self.grace_expired(&mut broken_since) {
                            return Err(OperationError::Protocol {
                                host,
                                detail: format!(
                                    "job {} status body stayed unparseable past the reboot grace window",
                                    job_id
                                ),
                            });
                        }
                        warn!("  Job {} on {} returned an unparseable body", job_id, host);
                    }
                },
                Ok(resp) => {
                    if self.grace_expired(&mut broken_since) {
                        return Err(OperationError::Protocol {
                            host,
                            detail: format!(
                                "job {} status read kept returning HTTP {}",
                                job_id, resp.status
                            ),
                        });
                    }
                    warn!(
                        "  Job {} on {} status read returned HTTP {}",
                        job_id, host, resp.status
                    );
                }
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Bounded tolerance for broken reads. The window opens at the first
    /// broken read and is reset by any good one; once it has been open for
    /// `reboot_grace` the underlying error is surfaced.
    fn grace_expired(&self, broken_since: &mut Option<Instant>) -> bool {
        let since = broken_since.get_or_insert_with(Instant::now);
        since.elapsed() >= self.reboot_grace
    }
}

pub fn first_message(task: &Value) -> String {
    task.get("Messages")
        .and_then(Value::as_array)
        .and_then(|messages| {
            messages
                .iter()
                .filter_map(|m| m.get("Message").and_then(Value::as_str))
                .find(|m| !m.is_empty())
        })
        .unwrap_or("")
        .to_string()
}
