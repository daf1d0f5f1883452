use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "propagator")]
#[command(about = "Export/import iDRAC golden templates (Server Configuration Profiles) via Redfish")]
pub struct Cli {
    /// Path to the config file (default: config.toml, or $IDRAC_CONFIG_FILE)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Operate on a specific server group (default: all groups)
    #[arg(short, long)]
    pub group: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the SCP from the source controller(s)
    Export,

    /// Import templates into target controllers
    Import {
        /// Path to an SCP file (optional when groups define template paths)
        file: Option<PathBuf>,
    },

    /// Export from the source, then import into all targets
    Apply,

    /// Validate config and controller connectivity
    Validate,

    /// Run the steps defined in the config ([pipeline] steps)
    Pipeline,
}
