use super::{Config, LegacySource, ResolvedGroup};
use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::constants::env as env_keys;

#[derive(Debug)]
pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn load(config_path: &Path) -> Result<Self> {
        let config = Self::load_configuration(config_path).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    /// Resolve all groups, or a single named group when a scope is given.
    pub fn select_groups(&self, group_name: Option<&str>) -> Result<Vec<ResolvedGroup>> {
        let all = self.current_config.resolve_groups()?;
        match group_name {
            None => Ok(all),
            Some(name) => {
                let selected: Vec<ResolvedGroup> =
                    all.iter().filter(|g| g.name == name).cloned().collect();
                if selected.is_empty() {
                    let available: Vec<&str> = all.iter().map(|g| g.name.as_str()).collect();
                    return Err(anyhow!(
                        "Unknown group '{}'. Available groups: {}",
                        name,
                        available.join(", ")
                    ));
                }
                Ok(selected)
            }
        }
    }

    async fn load_configuration(config_path: &Path) -> Result<Config> {
        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {}. Copy config.toml.example to config.toml and adjust values.",
                config_path.display()
            ));
        }

        debug!("Loading config: {}", config_path.display());
        let content = fs::read_to_string(config_path)
            .await
            .map_err(|e| anyhow!("Failed to read config {}: {}", config_path.display(), e))?;

        let mut config: Config =
            toml::from_str(&content).map_err(|e| anyhow!("Failed to parse config: {}", e))?;

        Self::apply_env_overrides(&mut config);

        let groups = config.resolve_groups()?;
        let host_count: usize = groups.iter().map(|g| 1 + g.targets.len()).sum();
        info!(
            "Configuration loaded: {} group(s), {} host(s)",
            groups.len(),
            host_count
        );

        Ok(config)
    }

    /// Environment overrides for pipeline runs, legacy format only.
    fn apply_env_overrides(config: &mut Config) {
        if !config.groups.is_empty() {
            return;
        }
        if let Ok(source_ip) = std::env::var(env_keys::SOURCE_IP) {
            if !source_ip.is_empty() {
                config.source = Some(LegacySource { ip: source_ip });
            }
        }
        if let Ok(target_ips) = std::env::var(env_keys::TARGET_IPS) {
            if !target_ips.is_empty() {
                config.targets = target_ips
                    .split(',')
                    .map(|ip| ip.trim().to_string())
                    .filter(|ip| !ip.is_empty())
                    .collect();
            }
        }
    }
}
