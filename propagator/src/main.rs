use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use propagator::cli::{Cli, Commands};
use propagator::config::{ConfigManager, Credentials};
use propagator::constants::env as env_keys;
use propagator::orchestrator::GroupOrchestrator;

const DEFAULT_CONFIG: &str = "config.toml";
const SECRETS_FILE: &str = "secrets.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Verbose mode opens up debug logs; noisy HTTP internals stay quiet
    // either way.
    let level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(format!("propagator={}", level).parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?);
    fmt().with_env_filter(env_filter).init();

    let config_path = cli
        .config
        .or_else(|| std::env::var(env_keys::CONFIG_FILE).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config_manager = ConfigManager::load(&config_path).await?;
    let config = config_manager.get_current_config();
    let groups = config_manager.select_groups(cli.group.as_deref())?;

    let credentials = Credentials::load(std::path::Path::new(SECRETS_FILE))?;
    let orchestrator = GroupOrchestrator::new(Arc::clone(&config), credentials);

    let summary = match &cli.command {
        Commands::Export => orchestrator.run_export(&groups).await,
        Commands::Import { file } => {
            if let Some(file) = file {
                if !file.exists() {
                    error!("File not found: {}", file.display());
                    std::process::exit(1);
                }
            }
            orchestrator.run_import(&groups, file.as_deref()).await
        }
        Commands::Apply => orchestrator.run_apply(&groups).await,
        Commands::Validate => orchestrator.run_validate(&groups).await,
        Commands::Pipeline => orchestrator.run_pipeline(&groups).await?,
    };

    println!("{}", summary.render(cli.verbose));

    if summary.all_succeeded() {
        info!("All {} unit(s) succeeded", summary.results().len());
        Ok(())
    } else {
        error!(
            "{} of {} unit(s) failed",
            summary.failed(),
            summary.results().len()
        );
        std::process::exit(1);
    }
}
