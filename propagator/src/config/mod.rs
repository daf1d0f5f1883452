pub mod credentials;
pub mod manager;
pub mod targets;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{defaults, redfish};

pub use credentials::Credentials;
pub use manager::ConfigManager;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub groups: HashMap<String, GroupConfig>,
    // Legacy single-group format: [source] ip = "..." plus a flat target list
    pub source: Option<LegacySource>,
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_job_timeout_seconds")]
    pub job_timeout_seconds: u64,
    #[serde(default = "default_reboot_grace_seconds")]
    pub reboot_grace_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    defaults::TIMEOUT_SECONDS
}

fn default_retries() -> u32 {
    defaults::RETRIES
}

fn default_retry_delay_seconds() -> u64 {
    defaults::RETRY_DELAY_SECONDS
}

fn default_poll_interval_seconds() -> u64 {
    defaults::POLL_INTERVAL_SECONDS
}

fn default_job_timeout_seconds() -> u64 {
    defaults::JOB_TIMEOUT_SECONDS
}

fn default_reboot_grace_seconds() -> u64 {
    defaults::REBOOT_GRACE_SECONDS
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            verify_ssl: false,
            timeout_seconds: defaults::TIMEOUT_SECONDS,
            retries: defaults::RETRIES,
            retry_delay_seconds: defaults::RETRY_DELAY_SECONDS,
            poll_interval_seconds: defaults::POLL_INTERVAL_SECONDS,
            job_timeout_seconds: defaults::JOB_TIMEOUT_SECONDS,
            reboot_grace_seconds: defaults::REBOOT_GRACE_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Components to export (ALL, BIOS, IDRAC, NIC, RAID, ...)
    #[serde(default = "default_export_target")]
    pub target: String,
    /// XML or JSON
    #[serde(default = "default_export_format")]
    pub format: String,
    /// Default, IncludeReadOnly or IncludePasswordHashValues
    #[serde(default = "default_export_include")]
    pub include: String,
}

fn default_export_target() -> String {
    "ALL".to_string()
}

fn default_export_format() -> String {
    "XML".to_string()
}

fn default_export_include() -> String {
    "Default".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            target: default_export_target(),
            format: default_export_format(),
            include: default_export_include(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Graceful, Forced or NoReboot
    #[serde(default = "default_shutdown_type")]
    pub shutdown_type: String,
    /// Host power state after import: On or Off
    #[serde(default = "default_host_power_state")]
    pub host_power_state: String,
}

fn default_shutdown_type() -> String {
    "Graceful".to_string()
}

fn default_host_power_state() -> String {
    "On".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            shutdown_type: default_shutdown_type(),
            host_power_state: default_host_power_state(),
        }
    }
}

/// Redfish resource paths. Firmware revisions vary the schema, so these are
/// configuration-injected rather than hardcoded in the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_manager_path")]
    pub manager_path: String,
    #[serde(default = "default_session_path")]
    pub session_path: String,
    #[serde(default = "default_task_path")]
    pub task_path: String,
}

fn default_manager_path() -> String {
    redfish::MANAGER_PATH.to_string()
}

fn default_session_path() -> String {
    redfish::SESSION_PATH.to_string()
}

fn default_task_path() -> String {
    redfish::TASK_PATH.to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            manager_path: default_manager_path(),
            session_path: default_session_path(),
            task_path: default_task_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default)]
    pub source_ip: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySource {
    pub ip: String,
}

/// A group after normalization: legacy configs folded into "default",
/// IP ranges expanded into concrete addresses.
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    pub name: String,
    pub source_ip: String,
    pub template: String,
    pub targets: Vec<String>,
}

impl Config {
    /// Normalize the configuration into a sorted list of resolved groups.
    ///
    /// A legacy single source/targets layout becomes one group named
    /// "default"; nothing downstream branches on the original format.
    pub fn resolve_groups(&self) -> anyhow::Result<Vec<ResolvedGroup>> {
        let mut resolved = Vec::new();

        if !self.groups.is_empty() {
            for (name, group) in &self.groups {
                resolved.push(ResolvedGroup {
                    name: name.clone(),
                    source_ip: group.source_ip.clone(),
                    template: group.template.clone(),
                    targets: targets::expand_targets(&group.targets)?,
                });
            }
            resolved.sort_by(|a, b| a.name.cmp(&b.name));
            return Ok(resolved);
        }

        resolved.push(ResolvedGroup {
            name: "default".to_string(),
            source_ip: self
                .source
                .as_ref()
                .map(|s| s.ip.clone())
                .unwrap_or_default(),
            template: String::new(),
            targets: targets::expand_targets(&self.targets)?,
        });
        Ok(resolved)
    }
}
