mod cli;
mod config;
mod engine;
mod error;
mod scrape;
mod store;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use config::SyncConfig;
use engine::SyncEngine;
use scrape::ScrapeClient;
use store::{BacklogSource, SupabaseStore};
use ui::SyncProgress;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::fatal(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // A missing .env is fine; the process environment still applies.
    dotenvy::dotenv().ok();

    let mut config = SyncConfig::load_from(&cli.config, |key| std::env::var(key).ok())
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply_overrides(&mut config);

    match cli.command {
        Command::Run => run_sync(&config, cli.verbose).await,
        Command::Pending => show_pending(&config, cli.verbose).await,
    }
}

async fn run_sync(config: &SyncConfig, verbose: bool) -> Result<()> {
    config.validate(true)?;

    let store = SupabaseStore::new(config)?;
    let scraper = ScrapeClient::new(config.scrape_url.clone(), config.request_timeout())?;
    let engine = SyncEngine::new(
        &scraper,
        &store,
        config.concurrency()?,
        config.failure_policy(),
    );

    let progress = SyncProgress::new(verbose);
    engine::sync(&store, &engine, &progress).await?;
    Ok(())
}

async fn show_pending(config: &SyncConfig, verbose: bool) -> Result<()> {
    config.validate(false)?;

    let store = SupabaseStore::new(config)?;
    let rooms = store
        .pending_rooms()
        .await
        .map_err(error::SyncError::Backlog)?;
    SyncProgress::new(verbose).pending(&rooms);
    Ok(())
}
