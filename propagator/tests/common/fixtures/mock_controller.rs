//! Mock Redfish management controller
//!
//! Simulates the handful of iDRAC resources the propagator touches: session
//! login, the manager base resource, the OEM export/import actions and the
//! task service. Tests compose these helpers, plus raw wiremock mounts for
//! failure sequences.

use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const MANAGER_PATH: &str = "/redfish/v1/Managers/iDRAC.Embedded.1";
pub const SESSION_PATH: &str = "/redfish/v1/SessionService/Sessions";
pub const TASK_PATH: &str = "/redfish/v1/TaskService/Tasks";

/// Model string mapping to generation 9, so OEM actions use the
/// EID_674_Manager prefix.
pub const GEN9_MODEL: &str = "14G Monolithic";

pub const EXPORT_ACTION_PATH: &str =
    "/redfish/v1/Managers/iDRAC.Embedded.1/Actions/Oem/EID_674_Manager.ExportSystemConfiguration";
pub const IMPORT_ACTION_PATH: &str =
    "/redfish/v1/Managers/iDRAC.Embedded.1/Actions/Oem/EID_674_Manager.ImportSystemConfiguration";

pub struct MockController {
    pub server: MockServer,
    pub base_url: String,
}

impl MockController {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Host string for config/group entries pointing at this mock.
    pub fn host(&self) -> String {
        self.base_url.clone()
    }

    /// Token-session login with a session resource for logout.
    pub async fn mock_session_login(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path(SESSION_PATH))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("X-Auth-Token", token)
                    .insert_header("Location", format!("{}/1", SESSION_PATH).as_str())
                    .set_body_json(json!({"Id": "1"})),
            )
            .mount(&self.server)
            .await;
    }

    /// Old firmware without a session service; clients fall back to basic
    /// auth.
    pub async fn mock_session_service_absent(&self) {
        Mock::given(method("POST"))
            .and(path(SESSION_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&self.server)
            .await;
    }

    /// Manager base resource with a model string (drives generation
    /// detection and serves as the post-reboot reachability probe).
    pub async fn mock_manager(&self, model: &str) {
        Mock::given(method("GET"))
            .and(path(MANAGER_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Id": "iDRAC.Embedded.1",
                "Model": model,
            })))
            .mount(&self.server)
            .await;
    }

    /// Export submit accepted; job handle returned via Location header.
    pub async fn mock_export_accepted(&self, job_id: &str) {
        Mock::given(method("POST"))
            .and(path(EXPORT_ACTION_PATH))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Location", format!("{}/{}", TASK_PATH, job_id).as_str()),
            )
            .mount(&self.server)
            .await;
    }

    /// Import submit accepted; job handle returned via Location header.
    pub async fn mock_import_accepted(&self, job_id: &str) {
        Mock::given(method("POST"))
            .and(path(IMPORT_ACTION_PATH))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Location", format!("{}/{}", TASK_PATH, job_id).as_str()),
            )
            .mount(&self.server)
            .await;
    }

    /// Task resource reporting one state until remounted or exhausted.
    pub async fn mock_task_state(&self, job_id: &str, state: &str, message: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}", TASK_PATH, job_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Id": job_id,
                "TaskState": state,
                "Messages": [{"Message": message}],
            })))
            .mount(&self.server)
            .await;
    }

    /// Completed export task carrying the profile document in the Dell OEM
    /// block.
    pub async fn mock_task_completed_with_profile(&self, job_id: &str, profile: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}", TASK_PATH, job_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Id": job_id,
                "TaskState": "Completed",
                "Messages": [{
                    "Message": "Export completed",
                    "Oem": {"Dell": {"ServerConfigurationProfile": profile}},
                }],
            })))
            .mount(&self.server)
            .await;
    }

    /// Task resource gone - the controller rebooted mid-job.
    pub async fn mock_task_missing(&self, job_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}", TASK_PATH, job_id)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&self.server)
            .await;
    }
}
