//! Config and credential builders for integration tests

use std::sync::Arc;

use propagator::config::{
    Config, ConnectionConfig, Credentials, EndpointsConfig, ExportConfig, GroupConfig,
    ImportConfig, ResolvedGroup,
};
use propagator::redfish::{ControllerDialect, DellDialect};

pub fn test_credentials() -> Credentials {
    Credentials::new("root", "calvin")
}

/// Connection settings tuned for tests: no backoff sleeps, tight polling,
/// zero reboot grace unless a test opts back in.
pub fn fast_connection() -> ConnectionConfig {
    ConnectionConfig {
        verify_ssl: false,
        timeout_seconds: 5,
        retries: 3,
        retry_delay_seconds: 0,
        poll_interval_seconds: 0,
        job_timeout_seconds: 30,
        reboot_grace_seconds: 0,
    }
}

pub fn test_dialect() -> Arc<dyn ControllerDialect> {
    Arc::new(DellDialect::new(EndpointsConfig::default()))
}

/// Full config around one resolved group, for orchestrator-level tests.
pub fn test_config(connection: ConnectionConfig, group: &ResolvedGroup) -> Arc<Config> {
    let mut config = Config {
        connection,
        export: ExportConfig::default(),
        import: ImportConfig::default(),
        endpoints: EndpointsConfig::default(),
        ..Config::default()
    };
    config.groups.insert(
        group.name.clone(),
        GroupConfig {
            source_ip: group.source_ip.clone(),
            template: group.template.clone(),
            targets: group.targets.clone(),
        },
    );
    Arc::new(config)
}

pub fn group(name: &str, source: &str, template: &str, targets: &[&str]) -> ResolvedGroup {
    ResolvedGroup {
        name: name.to_string(),
        source_ip: source.to_string(),
        template: template.to_string(),
        targets: targets.iter().map(|t| t.to_string()).collect(),
    }
}
