use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "visitor-counter", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Apply the database migration and exit
    #[arg(long)]
    pub migrate_only: bool,
}
