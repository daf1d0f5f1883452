//! Group orchestration
//!
//! Drives export/import/apply/validate across resolved groups. Groups run
//! sequentially; targets inside a group fan out concurrently. Every host
//! unit of work is isolated: its errors become one `OperationResult` and
//! never abort sibling hosts or groups. The only shared state is the
//! read-only configuration and the result list, which is assembled from
//! task return values at the join point.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{Config, Credentials, ResolvedGroup};
use crate::errors::OperationError;
use crate::profile_store;
use crate::redfish::{ControllerDialect, DellDialect, RedfishClient};
use crate::results::{OperationResult, RunSummary};
use crate::services::{ExportService, ImportService};

/// Lifecycle of one group inside a run. Purely observational: transitions
/// are logged so a pipeline trace shows where a group stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStage {
    Pending,
    Exporting,
    Exported,
    Importing,
    Done,
    Failed,
}

fn advance(group: &str, stage: &mut GroupStage, next: GroupStage) {
    debug!("Group '{}' stage {:?} -> {:?}", group, *stage, next);
    *stage = next;
}

pub struct GroupOrchestrator {
    config: Arc<Config>,
    credentials: Credentials,
    dialect: Arc<dyn ControllerDialect>,
    run_id: Uuid,
}

impl GroupOrchestrator {
    pub fn new(config: Arc<Config>, credentials: Credentials) -> Self {
        let dialect: Arc<dyn ControllerDialect> =
            Arc::new(DellDialect::new(config.endpoints.clone()));
        Self {
            config,
            credentials,
            dialect,
            run_id: Uuid::new_v4(),
        }
    }

    fn client(&self, host: &str) -> Result<RedfishClient, OperationError> {
        RedfishClient::new(
            host,
            self.credentials.clone(),
            self.config.connection.clone(),
            self.dialect.clone(),
        )
    }

    /// Export the golden template from every group source.
    pub async fn run_export(&self, groups: &[ResolvedGroup]) -> RunSummary {
        info!(
            "Export run {} across {} group(s)",
            self.run_id,
            groups.len()
        );

        let mut summary = RunSummary::new();
        for group in groups {
            let mut stage = GroupStage::Pending;
            advance(&group.name, &mut stage, GroupStage::Exporting);
            let (result, _) = self.export_group(group).await;
            let next = if result.success {
                GroupStage::Done
            } else {
                GroupStage::Failed
            };
            advance(&group.name, &mut stage, next);
            summary.push(result);
        }
        summary
    }

    /// Import each group's persisted template into all of its targets. An
    /// explicit file overrides every group's configured template path.
    pub async fn run_import(
        &self,
        groups: &[ResolvedGroup],
        file_override: Option<&Path>,
    ) -> RunSummary {
        info!(
            "Import run {} across {} group(s)",
            self.run_id,
            groups.len()
        );

        let mut summary = RunSummary::new();
        for group in groups {
            let mut stage = GroupStage::Pending;
            advance(&group.name, &mut stage, GroupStage::Importing);

            let template = match file_override {
                Some(path) => path.to_path_buf(),
                None => PathBuf::from(&group.template),
            };
            if template.as_os_str().is_empty() {
                error!(
                    "No template file for group '{}'. Provide a file argument or set 'template' in the group config.",
                    group.name
                );
                summary.push(OperationResult::failed(
                    &group.name,
                    &group.source_ip,
                    "import",
                    &OperationError::Persistence {
                        path: String::new(),
                        detail: format!("no template file configured for group '{}'", group.name),
                    },
                    std::time::Duration::ZERO,
                ));
                advance(&group.name, &mut stage, GroupStage::Failed);
                continue;
            }

            let results = self.import_group(group, &template).await;
            let next = if results.iter().all(|r| r.success) {
                GroupStage::Done
            } else {
                GroupStage::Failed
            };
            advance(&group.name, &mut stage, next);
            summary.extend(results);
        }
        summary
    }

    /// Export then import per group, using the freshly exported document.
    pub async fn run_apply(&self, groups: &[ResolvedGroup]) -> RunSummary {
        info!("Apply run {} across {} group(s)", self.run_id, groups.len());

        let mut summary = RunSummary::new();
        for group in groups {
            let mut stage = GroupStage::Pending;
            advance(&group.name, &mut stage, GroupStage::Exporting);

            let (export_result, template) = self.export_group(group).await;
            summary.push(export_result);

            let Some(template) = template else {
                advance(&group.name, &mut stage, GroupStage::Failed);
                continue;
            };
            advance(&group.name, &mut stage, GroupStage::Exported);

            advance(&group.name, &mut stage, GroupStage::Importing);
            let results = self.import_group(group, &template).await;
            let next = if results.iter().all(|r| r.success) {
                GroupStage::Done
            } else {
                GroupStage::Failed
            };
            advance(&group.name, &mut stage, next);
            summary.extend(results);
        }
        summary
    }

    /// Login check against every host in scope. No job is submitted and no
    /// controller state is mutated.
    pub async fn run_validate(&self, groups: &[ResolvedGroup]) -> RunSummary {
        let mut hosts: Vec<(String, &'static str, String)> = Vec::new();
        for group in groups {
            if !group.source_ip.is_empty() {
                hosts.push((group.name.clone(), "source", group.source_ip.clone()));
            }
            for target in &group.targets {
                hosts.push((group.name.clone(), "target", target.clone()));
            }
        }

        info!(
            "Validate run {} against {} host(s)",
            self.run_id,
            hosts.len()
        );

        let tasks = hosts.iter().map(|(group, role, host)| async move {
            let started = Instant::now();
            match self.validate_host(host).await {
                Ok(generation) => OperationResult::ok(
                    group,
                    host,
                    "validate",
                    format!("{} reachable (controller generation {})", role, generation),
                    started.elapsed(),
                ),
                Err(err) => {
                    error!("  [{}] [{}] {} FAIL ({})", group, role, host, err);
                    OperationResult::failed(group, host, "validate", &err, started.elapsed())
                }
            }
        });

        let mut summary = RunSummary::new();
        summary.extend(join_all(tasks).await);
        summary
    }

    /// Run the step list from the `[pipeline]` config block, in order.
    pub async fn run_pipeline(&self, groups: &[ResolvedGroup]) -> anyhow::Result<RunSummary> {
        let steps = &self.config.pipeline.steps;
        if steps.is_empty() {
            info!("pipeline.steps is empty - nothing to do");
            return Ok(RunSummary::new());
        }

        const VALID_STEPS: &[&str] = &["validate", "export", "import", "apply"];
        for step in steps {
            if !VALID_STEPS.contains(&step.as_str()) {
                return Err(anyhow::anyhow!(
                    "Unknown pipeline step '{}'. Valid steps: {}",
                    step,
                    VALID_STEPS.join(", ")
                ));
            }
        }

        info!("Pipeline steps: {}", steps.join(" -> "));

        let mut summary = RunSummary::new();
        for step in steps {
            info!("=== PIPELINE STEP: {} ===", step.to_uppercase());
            let step_summary = match step.as_str() {
                "validate" => self.run_validate(groups).await,
                "export" => self.run_export(groups).await,
                "import" => self.run_import(groups, None).await,
                "apply" => self.run_apply(groups).await,
                _ => unreachable!("steps validated above"),
            };
            summary.extend(step_summary.into_results());
        }
        Ok(summary)
    }

    /// Export one group's template and persist it. Returns the written path
    /// on success so `apply` can feed it straight into the import phase.
    async fn export_group(&self, group: &ResolvedGroup) -> (OperationResult, Option<PathBuf>) {
        let started = Instant::now();

        if group.source_ip.is_empty() {
            let err = OperationError::Protocol {
                host: format!("group '{}'", group.name),
                detail: "no source IP configured".to_string(),
            };
            error!("{}", err);
            return (
                OperationResult::failed(&group.name, "-", "export", &err, started.elapsed()),
                None,
            );
        }

        info!(
            "--- Exporting group '{}' from {} ---",
            group.name, group.source_ip
        );

        match self.export_group_inner(group).await {
            Ok(path) => {
                let result = OperationResult::ok(
                    &group.name,
                    &group.source_ip,
                    "export",
                    format!("template written to {}", path.display()),
                    started.elapsed(),
                );
                (result, Some(path))
            }
            Err(err) => {
                error!("Export for group '{}' failed: {}", group.name, err);
                (
                    OperationResult::failed(
                        &group.name,
                        &group.source_ip,
                        "export",
                        &err,
                        started.elapsed(),
                    ),
                    None,
                )
            }
        }
    }

    async fn export_group_inner(&self, group: &ResolvedGroup) -> Result<PathBuf, OperationError> {
        let mut client = self.client(&group.source_ip)?;
        let service = ExportService::new(
            self.config.export.clone(),
            self.config.connection.clone(),
        );
        let document = service.export(&mut client).await?;

        let path = if group.template.is_empty() {
            profile_store::default_export_path(&group.source_ip, &self.config.export.format)
        } else {
            PathBuf::from(&group.template)
        };
        profile_store::write_profile(&path, &document).await?;
        Ok(path)
    }

    /// Fan the import out across all targets of one group. One result per
    /// target, collected at the join point.
    async fn import_group(&self, group: &ResolvedGroup, template: &Path) -> Vec<OperationResult> {
        if group.targets.is_empty() {
            let err = OperationError::Protocol {
                host: format!("group '{}'", group.name),
                detail: "no targets configured".to_string(),
            };
            error!("{}", err);
            return vec![OperationResult::failed(
                &group.name,
                "-",
                "import",
                &err,
                std::time::Duration::ZERO,
            )];
        }

        let document = match profile_store::read_profile(template).await {
            Ok(bytes) => Arc::new(bytes),
            Err(err) => {
                error!("Cannot read template for group '{}': {}", group.name, err);
                return vec![OperationResult::failed(
                    &group.name,
                    "-",
                    "import",
                    &err,
                    std::time::Duration::ZERO,
                )];
            }
        };

        info!(
            "--- Importing group '{}' ({} targets) from {} ---",
            group.name,
            group.targets.len(),
            template.display()
        );

        let tasks = group.targets.iter().map(|target| {
            let document = document.clone();
            let group_name = group.name.clone();
            async move {
                let started = Instant::now();
                match self.import_one(target, &document).await {
                    Ok(()) => OperationResult::ok(
                        &group_name,
                        target,
                        "import",
                        "template applied",
                        started.elapsed(),
                    ),
                    Err(err) => {
                        error!("  Import to {} failed: {}", target, err);
                        OperationResult::failed(&group_name, target, "import", &err, started.elapsed())
                    }
                }
            }
        });

        join_all(tasks).await
    }

    async fn import_one(&self, target: &str, document: &[u8]) -> Result<(), OperationError> {
        let mut client = self.client(target)?;
        let service = ImportService::new(
            self.config.import.clone(),
            self.config.export.target.clone(),
            self.config.connection.clone(),
        );
        service.import(&mut client, document).await
    }

    async fn validate_host(&self, host: &str) -> Result<u8, OperationError> {
        let mut client = self.client(host)?;
        client.login().await?;
        let result = client.ensure_generation().await;
        client.logout().await;
        result
    }
}
