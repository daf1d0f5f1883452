//! Server Configuration Profile export
//!
//! Submits the OEM export action on a source controller, drives the job to
//! completion and returns the profile document. A completed job with no
//! payload is a failure: a truncated or empty document must never be
//! propagated to a fleet.

use serde_json::{json, Value};
use tracing::info;

use crate::config::{ConnectionConfig, ExportConfig};
use crate::errors::OperationError;
use crate::redfish::{JobOutcome, JobPoller, RedfishClient};

pub struct ExportService {
    export: ExportConfig,
    connection: ConnectionConfig,
}

impl ExportService {
    pub fn new(export: ExportConfig, connection: ConnectionConfig) -> Self {
        Self { export, connection }
    }

    /// Export the profile from one source controller. The session is torn
    /// down on every exit path.
    pub async fn export(&self, client: &mut RedfishClient) -> Result<Vec<u8>, OperationError> {
        client.login().await?;
        let result = self.export_inner(client).await;
        client.logout().await;
        result
    }

    async fn export_inner(&self, client: &mut RedfishClient) -> Result<Vec<u8>, OperationError> {
        let host = client.host().to_string();
        let generation = client.ensure_generation().await?;
        let dialect = client.dialect();
        let action = dialect.export_action_path(generation);

        let mut payload = json!({
            "ExportFormat": self.export.format,
            "ShareParameters": {
                "Target": self.export.target,
            },
        });
        // IncludeInExport is only understood by iDRAC9 and later
        if !self.export.include.eq_ignore_ascii_case("default") && generation >= 9 {
            payload["IncludeInExport"] = json!(self.export.include);
        }

        info!("--- EXPORT SCP FROM {} ---", host);
        info!("  Target components : {}", self.export.target);
        info!("  Format            : {}", self.export.format);
        info!("  Include           : {}", self.export.include);
        info!("  POST {}", action);

        let resp = client.post_json(&action, &payload).await?;
        if resp.status != 200 && resp.status != 202 {
            return Err(OperationError::Protocol {
                host,
                detail: format!(
                    "export request rejected with HTTP {}: {}",
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
                detail: "no job handle in export response".to_string(),
            })?;
        info!("  Export job created: {}", job_id);

        let poller = JobPoller::new(&self.connection);
        match poller.poll(client, &job_id).await? {
            JobOutcome::Completed(task) => {
                let profile = dialect
                    .profile_from_task(&task, &self.export.format)
                    .filter(|p| !p.trim().is_empty())
                    .ok_or_else(|| OperationError::Protocol {
                        host: host.clone(),
                        detail: format!(
                            "export job {} completed but returned no configuration data",
                            job_id
                        ),
                    })?;
                info!("--- EXPORT COMPLETE ({} bytes) ---", profile.len());
                Ok(profile.into_bytes())
            }
            JobOutcome::Failed { state, message } => Err(OperationError::JobFailed {
                host,
                job_id,
                state,
                message,
            }),
            // Export jobs do not survive a controller reset; a vanished task
            // cannot have produced a document.
            JobOutcome::Vanished => Err(OperationError::JobFailed {
                host,
                job_id,
                state: "Vanished".to_string(),
                message: "task resource disappeared before completion".to_string(),
            }),
        }
    }
}
