//! Server Configuration Profile import
//!
//! Submits the OEM import action with the profile document inlined, then
//! waits out the job. Imports routinely reboot the controller mid-job; when
//! the task resource disappears without an explicit failure marker, one
//! confirmatory re-query of the manager resource decides the outcome. An
//! unconfirmed ambiguous result is always reported as failure — a green
//! pipeline must mean the template is actually applied.

use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{ConnectionConfig, ImportConfig};
use crate::errors::OperationError;
use crate::redfish::poller::first_message;
use crate::redfish::{JobOutcome, JobPoller, RedfishClient};

pub struct ImportService {
    import: ImportConfig,
    /// ShareParameters.Target, shared with the export option block.
    target: String,
    connection: ConnectionConfig,
}

impl ImportService {
    pub fn new(import: ImportConfig, target: String, connection: ConnectionConfig) -> Self {
        Self {
            import,
            target,
            connection,
        }
    }

    /// Import the profile document into one target controller. The session
    /// is torn down on every exit path.
    pub async fn import(
        &self,
        client: &mut RedfishClient,
        document: &[u8],
    ) -> Result<(), OperationError> {
        client.login().await?;
        let result = self.import_inner(client, document).await;
        client.logout().await;
        result
    }

    async fn import_inner(
        &self,
        client: &mut RedfishClient,
        document: &[u8],
    ) -> Result<(), OperationError> {
        let host = client.host().to_string();
        let generation = client.ensure_generation().await?;
        let dialect = client.dialect();
        let action = dialect.import_action_path(generation);

        // The controller expects the document as a single-line string
        let buffer = collapse_import_buffer(&String::from_utf8_lossy(document));
        if buffer.is_empty() {
            return Err(OperationError::Protocol {
                host,
                detail: "profile document is empty after normalization".to_string(),
            });
        }

        info!("--- IMPORT SCP TO {} ---", host);
        info!("  Target          : {}", self.target);
        info!("  Shutdown type   : {}", self.import.shutdown_type);
        info!("  Host power state: {}", self.import.host_power_state);
        info!("  POST {}", action);

        let payload = json!({
            "ImportBuffer": buffer,
            "ShutdownType": self.import.shutdown_type,
            "HostPowerState": self.import.host_power_state,
            "ShareParameters": {
                "Target": self.target,
            },
        });

        let resp = client.post_json(&action, &payload).await?;
        if resp.status != 200 && resp.status != 202 {
            return Err(OperationError::Protocol {
                host,
                detail: format!(
                    "import request rejected with HTTP {}: {}",
                    resp.status,
                    resp.body.chars().take(500).collect::<String>()
                ),
            });
        }

        let body = resp.json().unwrap_or(Value::Null);
        let job_id = dialect
            .job_id_from_submit(resp.location.as_deref(), &body)
            .ok_or_else(|| OperationError::Protocol {
                host: host.clone(),
                detail: "no job handle in import response".to_string(),
            })?;
        info!("  Import job created: {}", job_id);

        let poller = JobPoller::new(&self.connection);
        match poller.poll(client, &job_id).await? {
            JobOutcome::Completed(task) => {
                info!(
                    "  Import to {} succeeded: {}",
                    host,
                    first_message(&task)
                );
                Ok(())
            }
            JobOutcome::Failed { state, message } => Err(OperationError::JobFailed {
                host,
                job_id,
                state,
                message,
            }),
            JobOutcome::Vanished => self.confirm_after_reboot(client, &job_id).await,
        }
    }

    /// The job resource disappeared without a failure marker — the expected
    /// shape of an import that reset the controller. Success is only
    /// declared once the manager resource answers sanely again, within the
    /// same grace window that bounds broken reads.
    async fn confirm_after_reboot(
        &self,
        client: &mut RedfishClient,
        job_id: &str,
    ) -> Result<(), OperationError> {
        let host = client.host().to_string();
        let deadline =
            Instant::now() + Duration::from_secs(self.connection.reboot_grace_seconds);
        let interval = Duration::from_secs(self.connection.poll_interval_seconds);

        info!(
            "  Job {} on {} vanished, confirming controller state after reboot",
            job_id, host
        );

        let mut last_detail = "no confirmation attempt made".to_string();
        loop {
            match client.fetch_manager().await {
                Ok(resp) if resp.is_success() && resp.json().is_some() => {
                    info!("  Controller {} reachable again, import confirmed", host);
                    return Ok(());
                }
                Ok(resp) => {
                    last_detail = format!("manager resource returned HTTP {}", resp.status);
                }
                Err(OperationError::Auth { .. }) => {
                    // Credentials stopped working mid-confirmation; the
                    // imported profile may have replaced them. Not provable
                    // as success from here.
                    return Err(OperationError::AmbiguousOutcome {
                        host,
                        job_id: job_id.to_string(),
                        detail: "controller rejected credentials during confirmation".to_string(),
                    });
                }
                Err(err) => {
                    last_detail = err.to_string();
                }
            }

            if Instant::now() >= deadline {
                return Err(OperationError::AmbiguousOutcome {
                    host,
                    job_id: job_id.to_string(),
                    detail: format!(
                        "controller did not come back within the confirmation window: {}",
                        last_detail
                    ),
                });
            }

            warn!("  Controller {} not confirmable yet: {}", host, last_detail);
            sleep(interval).await;
        }
    }
}

/// Collapse a profile document into the single-line form the import action
/// expects: whitespace between adjacent tags is dropped, newlines are
/// dropped everywhere.
pub fn collapse_import_buffer(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut pending_ws = String::new();

    for c in content.chars() {
        if c == '\n' || c == '\r' {
            continue;
        }
        if c.is_whitespace() {
            pending_ws.push(c);
            continue;
        }
        if c == '<' && out.ends_with('>') {
            pending_ws.clear();
        }
        out.push_str(&pending_ws);
        pending_ws.clear();
        out.push(c);
    }

    out.trim().to_string()
}
