//! Controller dialect
//!
//! Vendors and firmware revisions move resource paths, job-handle locations
//! and terminal-state vocabulary around. All of that variance is confined to
//! this trait; the client and poller stay schema-agnostic. One Dell-flavored
//! default implementation ships here, seeded from the `[endpoints]` config
//! block so drifted firmware can be accommodated without code changes.

use serde_json::Value;

use crate::config::EndpointsConfig;
use crate::constants::redfish;

pub trait ControllerDialect: Send + Sync {
    /// Management controller base resource, also used as the reachability
    /// probe after a reboot.
    fn manager_path(&self) -> &str;

    /// Session collection for token login.
    fn session_path(&self) -> &str;

    /// Status resource for one job.
    fn task_path(&self, job_id: &str) -> String;

    /// OEM export action URI for a detected controller generation.
    fn export_action_path(&self, generation: u8) -> String;

    /// OEM import action URI for a detected controller generation.
    fn import_action_path(&self, generation: u8) -> String;

    /// Map the manager resource model string to a controller generation.
    fn generation_from_model(&self, model: &str) -> u8;

    /// Case-insensitive success marker check.
    fn is_success_state(&self, state: &str) -> bool;

    /// Case-insensitive failure marker check.
    fn is_failure_state(&self, state: &str) -> bool;

    /// Pull the job identifier out of a submit response: Location header
    /// first, body fields as fallback.
    fn job_id_from_submit(&self, location: Option<&str>, body: &Value) -> Option<String>;

    /// Extract the configuration profile payload from a completed export
    /// task document. Returns None when the task carries no payload.
    fn profile_from_task(&self, task: &Value, format: &str) -> Option<String>;
}

pub struct DellDialect {
    endpoints: EndpointsConfig,
}

const FAILURE_STATES: &[&str] = &[
    "failed",
    "exception",
    "completedwitherrors",
    "rollbackfailed",
    "cancelled",
    "killed",
];

impl DellDialect {
    pub fn new(endpoints: EndpointsConfig) -> Self {
        Self { endpoints }
    }

    fn oem_action_path(&self, generation: u8, action: &str) -> String {
        let prefix = if generation >= 10 {
            redfish::OEM_PREFIX_MODERN
        } else {
            redfish::OEM_PREFIX_LEGACY
        };
        format!(
            "{}/Actions/Oem/{}.{}",
            self.endpoints.manager_path, prefix, action
        )
    }
}

impl ControllerDialect for DellDialect {
    fn manager_path(&self) -> &str {
        &self.endpoints.manager_path
    }

    fn session_path(&self) -> &str {
        &self.endpoints.session_path
    }

    fn task_path(&self, job_id: &str) -> String {
        format!("{}/{}", self.endpoints.task_path, job_id)
    }

    fn export_action_path(&self, generation: u8) -> String {
        self.oem_action_path(generation, redfish::EXPORT_ACTION)
    }

    fn import_action_path(&self, generation: u8) -> String {
        self.oem_action_path(generation, redfish::IMPORT_ACTION)
    }

    fn generation_from_model(&self, model: &str) -> u8 {
        // Model strings name the server generation: 12/13G shipped iDRAC8,
        // 14-16G shipped iDRAC9, anything newer is treated as iDRAC10.
        if model.contains("12") || model.contains("13") {
            8
        } else if model.contains("14") || model.contains("15") || model.contains("16") {
            9
        } else {
            10
        }
    }

    fn is_success_state(&self, state: &str) -> bool {
        state.eq_ignore_ascii_case("completed")
    }

    fn is_failure_state(&self, state: &str) -> bool {
        let state = state.to_ascii_lowercase();
        FAILURE_STATES.contains(&state.as_str())
    }

    fn job_id_from_submit(&self, location: Option<&str>, body: &Value) -> Option<String> {
        if let Some(location) = location {
            let id = location.trim_end_matches('/').rsplit('/').next()?;
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }

        if let Some(id) = body.get("Id").and_then(Value::as_str) {
            return Some(id.to_string());
        }

        body.get("@odata.id")
            .and_then(Value::as_str)
            .and_then(|uri| uri.trim_end_matches('/').rsplit('/').next())
            .map(|id| id.to_string())
    }

    fn profile_from_task(&self, task: &Value, format: &str) -> Option<String> {
        let messages = task.get("Messages").and_then(Value::as_array);

        // Newer firmware nests the document under Oem.Dell in a task message
        if let Some(messages) = messages {
            for msg in messages {
                if let Some(profile) = msg
                    .get("Oem")
                    .and_then(|oem| oem.get("Dell"))
                    .and_then(|dell| dell.get("ServerConfigurationProfile"))
                {
                    return match profile {
                        Value::String(text) => Some(text.clone()),
                        other => serde_json::to_string_pretty(other).ok(),
                    };
                }
            }

            // Some revisions put the whole document into the message text
            for msg in messages {
                let content = msg
                    .get("Message")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or("");
                if format.eq_ignore_ascii_case("XML") && content.starts_with('<') {
                    return Some(content.to_string());
                }
                if format.eq_ignore_ascii_case("JSON") && content.starts_with('{') {
                    return Some(content.to_string());
                }
            }
        }

        // Last resort: an XML document buried in an arbitrary string field
        if format.eq_ignore_ascii_case("XML") {
            return find_system_configuration(task);
        }

        None
    }
}

/// Walk every string value in the task document looking for an embedded
/// `<SystemConfiguration>` element.
fn find_system_configuration(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let start = text.find("<SystemConfiguration")?;
            let end_tag = "</SystemConfiguration>";
            let end = text[start..].find(end_tag)?;
            Some(text[start..start + end + end_tag.len()].to_string())
        }
        Value::Array(items) => items.iter().find_map(find_system_configuration),
        Value::Object(map) => map.values().find_map(find_system_configuration),
        _ => None,
    }
}
