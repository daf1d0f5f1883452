//! Export and import services end to end against the mock controller

mod common;

use common::fixtures::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use propagator::config::{ExportConfig, ImportConfig};
use propagator::redfish::RedfishClient;
use propagator::services::{ExportService, ImportService};

const PROFILE: &str = "<SystemConfiguration Model=\"PowerEdge R740\"><Component FQDD=\"BIOS.Setup.1-1\"/></SystemConfiguration>";

fn client_for(controller: &MockController) -> RedfishClient {
    RedfishClient::new(
        &controller.host(),
        test_credentials(),
        fast_connection(),
        test_dialect(),
    )
    .expect("client should build")
}

fn export_service() -> ExportService {
    ExportService::new(ExportConfig::default(), fast_connection())
}

fn import_service() -> ImportService {
    ImportService::new(ImportConfig::default(), "ALL".to_string(), fast_connection())
}

#[tokio::test]
async fn export_returns_profile_document() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_manager(mock_controller::GEN9_MODEL).await;
    controller.mock_export_accepted("JID_101").await;
    controller
        .mock_task_completed_with_profile("JID_101", PROFILE)
        .await;

    let mut client = client_for(&controller);
    let document = export_service().export(&mut client).await.unwrap();
    assert_eq!(document, PROFILE.as_bytes());
}

#[tokio::test]
async fn export_job_failure_is_job_failed() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_manager(mock_controller::GEN9_MODEL).await;
    controller.mock_export_accepted("JID_102").await;
    controller
        .mock_task_state("JID_102", "Failed", "Unable to export the configuration")
        .await;

    let mut client = client_for(&controller);
    let err = export_service().export(&mut client).await.unwrap_err();
    assert_eq!(err.kind(), "job_failed");
}

#[tokio::test]
async fn export_with_empty_payload_is_rejected() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_manager(mock_controller::GEN9_MODEL).await;
    controller.mock_export_accepted("JID_103").await;
    // Completed, but no configuration data anywhere in the task
    controller.mock_task_state("JID_103", "Completed", "Done").await;

    let mut client = client_for(&controller);
    let err = export_service().export(&mut client).await.unwrap_err();
    assert_eq!(err.kind(), "protocol");
}

#[tokio::test]
async fn export_vanished_job_is_a_failure() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_manager(mock_controller::GEN9_MODEL).await;
    controller.mock_export_accepted("JID_104").await;
    controller.mock_task_missing("JID_104").await;

    let mut client = client_for(&controller);
    let err = export_service().export(&mut client).await.unwrap_err();
    assert_eq!(err.kind(), "job_failed");
}

#[tokio::test]
async fn export_submit_rejection_surfaces_detail() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_manager(mock_controller::GEN9_MODEL).await;
    Mock::given(method("POST"))
        .and(path(mock_controller::EXPORT_ACTION_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("SYS011: invalid target"))
        .mount(&controller.server)
        .await;

    let mut client = client_for(&controller);
    let err = export_service().export(&mut client).await.unwrap_err();
    assert_eq!(err.kind(), "protocol");
    assert!(err.to_string().contains("SYS011"));
}

#[tokio::test]
async fn import_completes_cleanly() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_manager(mock_controller::GEN9_MODEL).await;
    controller.mock_import_accepted("JID_201").await;
    controller
        .mock_task_state("JID_201", "Completed", "Successfully imported")
        .await;

    let mut client = client_for(&controller);
    import_service()
        .import(&mut client, PROFILE.as_bytes())
        .await
        .unwrap();
}

#[tokio::test]
async fn import_job_failure_is_job_failed() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_manager(mock_controller::GEN9_MODEL).await;
    controller.mock_import_accepted("JID_202").await;
    controller
        .mock_task_state("JID_202", "RollbackFailed", "Import failed, rollback failed too")
        .await;

    let mut client = client_for(&controller);
    let err = import_service()
        .import(&mut client, PROFILE.as_bytes())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "job_failed");
}

#[tokio::test]
async fn import_vanished_job_confirmed_by_healthy_manager() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    // Manager answers both the generation probe and the post-reboot
    // confirmation.
    controller.mock_manager(mock_controller::GEN9_MODEL).await;
    controller.mock_import_accepted("JID_203").await;
    controller.mock_task_missing("JID_203").await;

    let mut client = client_for(&controller);
    import_service()
        .import(&mut client, PROFILE.as_bytes())
        .await
        .unwrap();
}

#[tokio::test]
async fn import_vanished_job_unconfirmed_is_ambiguous() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_import_accepted("JID_204").await;
    controller.mock_task_missing("JID_204").await;

    // One good manager read for generation detection, then the controller
    // never comes back.
    Mock::given(method("GET"))
        .and(path(mock_controller::MANAGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Model": "14G"})))
        .up_to_n_times(1)
        .mount(&controller.server)
        .await;
    Mock::given(method("GET"))
        .and(path(mock_controller::MANAGER_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&controller.server)
        .await;

    let mut connection = fast_connection();
    connection.retries = 0;

    let mut client = RedfishClient::new(
        &controller.host(),
        test_credentials(),
        connection.clone(),
        test_dialect(),
    )
    .unwrap();
    let service = ImportService::new(ImportConfig::default(), "ALL".to_string(), connection);

    let err = service
        .import(&mut client, PROFILE.as_bytes())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ambiguous");
}

#[tokio::test]
async fn empty_document_is_rejected_before_submit() {
    let controller = MockController::start().await;
    controller.mock_session_service_absent().await;
    controller.mock_manager(mock_controller::GEN9_MODEL).await;

    let mut client = client_for(&controller);
    let err = import_service()
        .import(&mut client, b"  \n  ")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "protocol");
}
