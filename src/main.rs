#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod counter;
mod db;
mod quotes;
mod utils;
mod web;

use cli::Cli;
use config::Config;
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Arc::new(
        Config::load_from_file(&cli.config)
            .with_context(|| format!("loading config from {}", cli.config.display()))?,
    );
    utils::logging::init_tracing(&config.logging);
    info!("visitor-counter {} starting up", env!("CARGO_PKG_VERSION"));

    let db_manager = db::DatabaseManager::new(&config.database).await?;
    db_manager.migrate().await?;
    info!("database ready ({})", db_manager.db_type().as_str());

    if cli.migrate_only {
        info!("migration finished, exiting");
        return Ok(());
    }

    let web_server = WebServer::new(config.clone(), &db_manager)?;
    web_server.start().await?;

    info!("visitor-counter shutting down");
    Ok(())
}
